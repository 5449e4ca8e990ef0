//! Read-through lookups against the platform: parents, ads, accounts, pages,
//! pixels and geo-targeting search.

use adlaunch_core::RemoteApiError;
use adlaunch_graph::{
    GeoLocation, LocationType, RemoteAd, RemoteAdAccount, RemoteAdSet, RemoteCampaign, RemotePage, RemotePixel,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::error;

use crate::rest::{api_error, ApiError, AppState};

const DEFAULT_SEARCH_LIMIT: u32 = 10;
const MAX_SEARCH_LIMIT: u32 = 100;

fn platform_error(what: &str, e: RemoteApiError) -> ApiError {
    error!(resource = what, error = %e, "Platform lookup failed");
    metrics::counter!("api.errors").increment(1);
    api_error(StatusCode::BAD_GATEWAY, "platform_error", e.to_string())
}

/// GET /api/v1/platform/campaigns
pub async fn list_campaigns(State(state): State<AppState>) -> Result<Json<Vec<RemoteCampaign>>, ApiError> {
    state
        .client
        .list_campaigns()
        .await
        .map(Json)
        .map_err(|e| platform_error("campaigns", e))
}

/// GET /api/v1/platform/campaigns/:id/ad-sets
pub async fn list_ad_sets(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
) -> Result<Json<Vec<RemoteAdSet>>, ApiError> {
    state
        .client
        .list_ad_sets(Some(&campaign_id))
        .await
        .map(Json)
        .map_err(|e| platform_error("ad sets", e))
}

/// GET /api/v1/platform/ad-sets/:id/ads
pub async fn list_ads(
    State(state): State<AppState>,
    Path(ad_set_id): Path<String>,
) -> Result<Json<Vec<RemoteAd>>, ApiError> {
    state
        .client
        .list_ads(&ad_set_id)
        .await
        .map(Json)
        .map_err(|e| platform_error("ads", e))
}

/// GET /api/v1/platform/ad-accounts
pub async fn list_ad_accounts(State(state): State<AppState>) -> Result<Json<Vec<RemoteAdAccount>>, ApiError> {
    state
        .client
        .list_ad_accounts()
        .await
        .map(Json)
        .map_err(|e| platform_error("ad accounts", e))
}

/// GET /api/v1/platform/pages
pub async fn list_pages(State(state): State<AppState>) -> Result<Json<Vec<RemotePage>>, ApiError> {
    state
        .client
        .list_pages()
        .await
        .map(Json)
        .map_err(|e| platform_error("pages", e))
}

/// GET /api/v1/platform/pixels
pub async fn list_pixels(State(state): State<AppState>) -> Result<Json<Vec<RemotePixel>>, ApiError> {
    state
        .client
        .list_pixels()
        .await
        .map(Json)
        .map_err(|e| platform_error("pixels", e))
}

#[derive(Debug, Deserialize)]
pub struct LocationSearchParams {
    pub q: String,
    #[serde(default, rename = "type")]
    pub location_type: LocationType,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// GET /api/v1/platform/locations/search?q=..&type=city&limit=10
pub async fn search_locations(
    State(state): State<AppState>,
    Query(params): Query<LocationSearchParams>,
) -> Result<Json<Vec<GeoLocation>>, ApiError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "invalid_query", "q must not be empty"));
    }
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT);
    state
        .client
        .search_locations(query, params.location_type, limit)
        .await
        .map(Json)
        .map_err(|e| platform_error("locations", e))
}
