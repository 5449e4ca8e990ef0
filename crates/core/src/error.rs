use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type LaunchResult<T> = Result<T, LaunchError>;

/// Which parent resource a resolution failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentResource {
    Campaign,
    AdSet,
}

impl fmt::Display for ParentResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentResource::Campaign => f.write_str("campaign"),
            ParentResource::AdSet => f.write_str("ad set"),
        }
    }
}

/// Failure reported by the remote ads platform for a single request.
///
/// Displays as `message`, or `message: user_message` when the platform
/// attached a user-facing explanation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}", self.display_message())]
pub struct RemoteApiError {
    pub message: String,
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}

impl RemoteApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_message: None,
            status: None,
        }
    }

    pub fn with_user_message(mut self, user_message: impl Into<String>) -> Self {
        self.user_message = Some(user_message.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn display_message(&self) -> String {
        match self.user_message.as_deref().filter(|m| !m.is_empty()) {
            Some(user) => format!("{}: {}", self.message, user),
            None => self.message.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Invalid creative input: {0}")]
    InvalidCreativeInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Budget conflict: {0}")]
    BudgetConflict(String),

    #[error("Failed to resolve {resource}: {source}")]
    ParentResolution {
        resource: ParentResource,
        #[source]
        source: RemoteApiError,
    },

    #[error("Page ID is missing. Select a Facebook Page for the creative before submitting.")]
    MissingPageId,

    #[error("Media asset {0} is not part of this batch")]
    MediaNotFound(String),

    #[error(transparent)]
    Remote(#[from] RemoteApiError),

    #[error("Media {media_id} was not ready after {waited_secs}s of processing")]
    MediaProcessingTimeout { media_id: String, waited_secs: u64 },

    #[error("Local persistence error: {0}")]
    LocalPersistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LaunchError {
    /// Errors that abort a run before any ad is submitted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LaunchError::InvalidCreativeInput(_)
                | LaunchError::Validation(_)
                | LaunchError::BudgetConflict(_)
                | LaunchError::ParentResolution { .. }
                | LaunchError::Config(_)
        )
    }
}
