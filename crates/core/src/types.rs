//! Bulk ad submission domain types: media, creative templates, the
//! permutation unit and per-run bookkeeping.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::campaign::BudgetType;
use crate::error::{LaunchError, LaunchResult};

/// Headlines and bodies accept at most this many non-empty variants.
pub const MAX_COPY_VARIANTS: usize = 3;

const VIDEO_EXTENSIONS: [&str; 4] = [".mp4", ".mov", ".webm", ".avi"];

// ─── Media ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Guess the kind from a file name or URL path.
    pub fn infer(reference: &str) -> Self {
        let lower = reference.to_ascii_lowercase();
        let path = lower.split(['?', '#']).next().unwrap_or_default();
        if VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

/// Where the bytes of a media asset come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaSource {
    LocalFile { path: PathBuf },
    RemoteUrl { url: Url },
}

impl MediaSource {
    /// Human-readable reference stored alongside local ad records.
    pub fn reference(&self) -> String {
        match self {
            MediaSource::LocalFile { path } => path.display().to_string(),
            MediaSource::RemoteUrl { url } => url.to_string(),
        }
    }
}

/// A single image or video attached to a submission batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaAsset {
    pub id: String,
    pub source: MediaSource,
    pub display_name: String,
    pub kind: MediaKind,
}

impl MediaAsset {
    /// Build an asset whose kind is inferred from its source reference.
    pub fn from_source(id: impl Into<String>, display_name: impl Into<String>, source: MediaSource) -> Self {
        let kind = MediaKind::infer(&source.reference());
        Self {
            id: id.into(),
            source,
            display_name: display_name.into(),
            kind,
        }
    }
}

// ─── Creative Template ──────────────────────────────────────────────────

/// Call-to-action button codes accepted by the platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallToAction {
    #[default]
    LearnMore,
    ShopNow,
    SignUp,
    ContactUs,
    Download,
    BookNow,
    BuyTickets,
    GetQuote,
    DonateNow,
}

impl CallToAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallToAction::LearnMore => "LEARN_MORE",
            CallToAction::ShopNow => "SHOP_NOW",
            CallToAction::SignUp => "SIGN_UP",
            CallToAction::ContactUs => "CONTACT_US",
            CallToAction::Download => "DOWNLOAD",
            CallToAction::BookNow => "BOOK_NOW",
            CallToAction::BuyTickets => "BUY_TICKETS",
            CallToAction::GetQuote => "GET_QUOTE",
            CallToAction::DonateNow => "DONATE_NOW",
        }
    }
}

/// Shared creative settings for every ad in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeTemplate {
    pub creative_name: String,
    pub headlines: Vec<String>,
    pub bodies: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub call_to_action: CallToAction,
    pub destination_url: String,
    #[serde(default)]
    pub page_id: Option<String>,
    #[serde(default)]
    pub instagram_actor_id: Option<String>,
}

impl CreativeTemplate {
    /// Headlines that take part in permutation, trimmed, in entry order.
    pub fn headline_options(&self) -> Vec<String> {
        non_empty_entries(&self.headlines)
    }

    /// Bodies that take part in permutation, trimmed, in entry order.
    pub fn body_options(&self) -> Vec<String> {
        non_empty_entries(&self.bodies)
    }

    pub fn page_id(&self) -> Option<&str> {
        non_blank(self.page_id.as_deref())
    }

    pub fn instagram_actor_id(&self) -> Option<&str> {
        non_blank(self.instagram_actor_id.as_deref())
    }

    /// Check the template before a run starts.
    pub fn validate(&self) -> LaunchResult<()> {
        if self.creative_name.trim().is_empty() {
            return Err(LaunchError::InvalidCreativeInput(
                "creative name must not be empty".into(),
            ));
        }
        check_variant_count("headline", self.headline_options().len())?;
        check_variant_count("body", self.body_options().len())?;
        parse_destination_url(&self.destination_url)?;
        Ok(())
    }
}

fn check_variant_count(field: &str, count: usize) -> LaunchResult<()> {
    if count == 0 {
        return Err(LaunchError::InvalidCreativeInput(format!(
            "at least one non-empty {field} is required"
        )));
    }
    if count > MAX_COPY_VARIANTS {
        return Err(LaunchError::InvalidCreativeInput(format!(
            "at most {MAX_COPY_VARIANTS} {field} variants are allowed, got {count}"
        )));
    }
    Ok(())
}

/// Parse a destination URL, accepting only absolute http(s) links.
pub fn parse_destination_url(raw: &str) -> LaunchResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        LaunchError::InvalidCreativeInput(format!("destination url '{raw}' is invalid: {e}"))
    })?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(LaunchError::InvalidCreativeInput(format!(
            "destination url '{raw}' must be an absolute http(s) link"
        ))),
    }
}

/// Trimmed, non-empty entries in their original order.
pub fn non_empty_entries(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ─── Permutation Unit ───────────────────────────────────────────────────

/// One ad to be created: a media asset paired with a headline and a body.
///
/// `headline_index` and `body_index` point into the template's *filtered*
/// headline and body options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdSpecification {
    pub id: String,
    pub display_name: String,
    pub media_asset_id: String,
    pub headline_index: usize,
    pub body_index: usize,
}

/// Remote ids shared by every ad in a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParentResourceRefs {
    pub campaign_remote_id: String,
    pub ad_set_remote_id: String,
    pub budget_type: BudgetType,
}

// ─── Results & Progress ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success,
    Failure,
}

/// Outcome of one processed ad specification. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionResult {
    pub spec_id: String,
    pub display_name: String,
    pub outcome: SubmissionOutcome,
    pub remote_ad_id: Option<String>,
    pub remote_creative_id: Option<String>,
    pub error_message: Option<String>,
}

impl SubmissionResult {
    pub fn success(spec: &AdSpecification, creative_id: String, ad_id: String) -> Self {
        Self {
            spec_id: spec.id.clone(),
            display_name: spec.display_name.clone(),
            outcome: SubmissionOutcome::Success,
            remote_ad_id: Some(ad_id),
            remote_creative_id: Some(creative_id),
            error_message: None,
        }
    }

    pub fn failure(spec: &AdSpecification, error: &LaunchError) -> Self {
        Self {
            spec_id: spec.id.clone(),
            display_name: spec.display_name.clone(),
            outcome: SubmissionOutcome::Failure,
            remote_ad_id: None,
            remote_creative_id: None,
            error_message: Some(format!("Failed to create {}: {}", spec.display_name, error)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == SubmissionOutcome::Success
    }
}

/// Running counters observed by progress subscribers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchProgress {
    pub total_count: usize,
    pub completed_count: usize,
    pub current_status_text: String,
}
