//! Shared state, error bodies and operational endpoints.

use adlaunch_core::LaunchError;
use adlaunch_graph::AdPlatformClient;
use adlaunch_pipeline::EngineSettings;
use adlaunch_store::RecordStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::runs::RunRegistry;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub client: Arc<dyn AdPlatformClient>,
    pub runs: Arc<RunRegistry>,
    pub settings: EngineSettings,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(client: Arc<dyn AdPlatformClient>, settings: EngineSettings) -> Self {
        Self {
            store: Arc::new(RecordStore::new()),
            client,
            runs: Arc::new(RunRegistry::new()),
            settings,
            start_time: Instant::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, error: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

/// Map a pipeline error onto an HTTP status and error code.
pub fn launch_error(e: &LaunchError) -> ApiError {
    let (status, code) = match e {
        LaunchError::InvalidCreativeInput(_) => (StatusCode::BAD_REQUEST, "invalid_creative_input"),
        LaunchError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
        LaunchError::BudgetConflict(_) => (StatusCode::BAD_REQUEST, "budget_conflict"),
        LaunchError::MissingPageId => (StatusCode::BAD_REQUEST, "missing_page_id"),
        LaunchError::ParentResolution { .. } | LaunchError::Remote(_) => (StatusCode::BAD_GATEWAY, "platform_error"),
        LaunchError::LocalPersistence(_) => (StatusCode::CONFLICT, "persistence_failed"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    api_error(status, code, e.to_string())
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub platform: String,
    pub uptime_secs: u64,
    pub active_runs: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        platform: state.client.platform_name().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_runs: state.runs.active_count(),
    })
}

/// GET /ready
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// GET /live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
