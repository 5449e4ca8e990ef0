//! Bulk-submission endpoints: preview, start, poll.

use adlaunch_core::records::AdRecordSink;
use adlaunch_core::types::AdSpecification;
use adlaunch_pipeline::BulkSubmissionRequest;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::rest::{launch_error, ApiError, AppState};
use crate::runs::RunSnapshot;

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub total: usize,
    pub specs: Vec<AdSpecification>,
}

#[derive(Debug, Serialize)]
pub struct StartedRun {
    pub run_id: Uuid,
    pub total: usize,
}

fn prepare(request: &BulkSubmissionRequest) -> Result<Vec<AdSpecification>, ApiError> {
    request.prepare().map_err(|e| {
        warn!(error = %e, "Bulk submission rejected");
        metrics::counter!("api.validation_errors").increment(1);
        launch_error(&e)
    })
}

/// POST /api/v1/bulk-submissions/preview: expand without touching the platform.
pub async fn preview(Json(request): Json<BulkSubmissionRequest>) -> Result<Json<PreviewResponse>, ApiError> {
    let specs = prepare(&request)?;
    Ok(Json(PreviewResponse {
        total: specs.len(),
        specs,
    }))
}

/// POST /api/v1/bulk-submissions: validate, then run in the background.
pub async fn start(
    State(state): State<AppState>,
    Json(request): Json<BulkSubmissionRequest>,
) -> Result<(StatusCode, Json<StartedRun>), ApiError> {
    let specs = prepare(&request)?;
    let total = specs.len();
    let records: Arc<dyn AdRecordSink> = state.store.clone();
    let run_id = state
        .runs
        .start(state.client.clone(), records, state.settings.clone(), request, specs);
    Ok((StatusCode::ACCEPTED, Json(StartedRun { run_id, total })))
}

/// GET /api/v1/bulk-submissions/:id
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunSnapshot>, StatusCode> {
    state.runs.snapshot(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// GET /api/v1/bulk-submissions
pub async fn list(State(state): State<AppState>) -> Json<Vec<RunSnapshot>> {
    Json(state.runs.list())
}
