//! Brand, product, customer-profile and local record endpoints.

use adlaunch_core::records::{LocalAdRecord, LocalAdSetRecord, LocalCampaignRecord};
use adlaunch_core::LaunchResult;
use adlaunch_store::models::*;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::rest::{api_error, ApiError, AppState};

// ─── Brands ────────────────────────────────────────────────────────────────

pub async fn list_brands(State(state): State<AppState>) -> Json<Vec<Brand>> {
    Json(state.store.list_brands())
}

pub async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Brand>, StatusCode> {
    state.store.get_brand(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn create_brand(
    State(state): State<AppState>,
    Json(req): Json<CreateBrandRequest>,
) -> Result<(StatusCode, Json<Brand>), ApiError> {
    if req.name.trim().is_empty() {
        metrics::counter!("api.validation_errors").increment(1);
        return Err(api_error(StatusCode::BAD_REQUEST, "invalid_brand", "brand name must not be empty"));
    }
    let brand = state.store.create_brand(req);
    metrics::counter!("api.brands.created").increment(1);
    Ok((StatusCode::CREATED, Json(brand)))
}

pub async fn update_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBrandRequest>,
) -> Result<Json<Brand>, StatusCode> {
    state.store.update_brand(id, req).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn delete_brand(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.store.delete_brand(id) {
        metrics::counter!("api.brands.deleted").increment(1);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn list_products(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Product>>, StatusCode> {
    state.store.list_products(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

// ─── Products ──────────────────────────────────────────────────────────────

fn empty_product_name() -> ApiError {
    metrics::counter!("api.validation_errors").increment(1);
    api_error(StatusCode::BAD_REQUEST, "invalid_product", "product name must not be empty")
}

/// POST /api/v1/brands/:id/products
pub async fn create_product(
    State(state): State<AppState>,
    Path(brand_id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    if input.name.trim().is_empty() {
        return Err(empty_product_name());
    }
    let product = state
        .store
        .create_product(brand_id, input)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "not_found", format!("brand {brand_id} not found")))?;
    metrics::counter!("api.products.created").increment(1);
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, StatusCode> {
    state.store.get_product(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(empty_product_name());
    }
    state
        .store
        .update_product(id, req)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "not_found", format!("product {id} not found")))
}

pub async fn delete_product(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.store.delete_product(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// ─── Customer profiles ─────────────────────────────────────────────────────

pub async fn list_profiles(State(state): State<AppState>) -> Json<Vec<CustomerProfile>> {
    Json(state.store.list_profiles())
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerProfile>, StatusCode> {
    state.store.get_profile(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn create_profile(
    State(state): State<AppState>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<CustomerProfile>), ApiError> {
    if req.name.trim().is_empty() {
        metrics::counter!("api.validation_errors").increment(1);
        return Err(api_error(StatusCode::BAD_REQUEST, "invalid_profile", "profile name must not be empty"));
    }
    let profile = state.store.create_profile(req);
    metrics::counter!("api.profiles.created").increment(1);
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<CustomerProfile>, StatusCode> {
    state.store.update_profile(id, req).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn delete_profile(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.store.delete_profile(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// ─── Campaign and ad set records ───────────────────────────────────────────

/// 201 when stored, 200 when a record with the same id already exists.
fn saved(id: String, outcome: LaunchResult<bool>) -> Result<(StatusCode, Json<SavedRecord>), ApiError> {
    match outcome {
        Ok(true) => Ok((StatusCode::CREATED, Json(SavedRecord { id, created: true }))),
        Ok(false) => Ok((StatusCode::OK, Json(SavedRecord { id, created: false }))),
        Err(e) => {
            metrics::counter!("api.validation_errors").increment(1);
            Err(api_error(StatusCode::BAD_REQUEST, "invalid_record", e.to_string()))
        }
    }
}

pub async fn list_campaigns(State(state): State<AppState>) -> Json<Vec<LocalCampaignRecord>> {
    Json(state.store.list_campaigns())
}

pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LocalCampaignRecord>, StatusCode> {
    state.store.get_campaign(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn save_campaign(
    State(state): State<AppState>,
    Json(record): Json<LocalCampaignRecord>,
) -> Result<(StatusCode, Json<SavedRecord>), ApiError> {
    let id = record.id.clone();
    saved(id, state.store.save_campaign(record))
}

#[derive(Debug, Deserialize)]
pub struct AdSetFilter {
    pub campaign_id: Option<String>,
}

pub async fn list_ad_sets(
    State(state): State<AppState>,
    Query(filter): Query<AdSetFilter>,
) -> Json<Vec<LocalAdSetRecord>> {
    Json(state.store.list_ad_sets(filter.campaign_id.as_deref()))
}

pub async fn get_ad_set(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LocalAdSetRecord>, StatusCode> {
    state.store.get_ad_set(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn save_ad_set(
    State(state): State<AppState>,
    Json(record): Json<LocalAdSetRecord>,
) -> Result<(StatusCode, Json<SavedRecord>), ApiError> {
    let id = record.id.clone();
    saved(id, state.store.save_ad_set(record))
}

// ─── Ad records ────────────────────────────────────────────────────────────

/// A single record or a batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AdRecordBody {
    Many(Vec<LocalAdRecord>),
    One(Box<LocalAdRecord>),
}

pub async fn list_ads(State(state): State<AppState>) -> Json<Vec<LocalAdRecord>> {
    Json(state.store.list_ads())
}

pub async fn list_ads_for_ad_set(
    State(state): State<AppState>,
    Path(ad_set_id): Path<String>,
) -> Json<Vec<LocalAdRecord>> {
    Json(state.store.list_ads_for_ad_set(&ad_set_id))
}

pub async fn create_ads(
    State(state): State<AppState>,
    Json(body): Json<AdRecordBody>,
) -> Json<Vec<InsertedRecord>> {
    let records = match body {
        AdRecordBody::Many(records) => records,
        AdRecordBody::One(record) => vec![*record],
    };
    let inserted = state.store.insert_ads(records);
    metrics::counter!("api.ads.recorded").increment(inserted.iter().filter(|r| r.success).count() as u64);
    Json(inserted)
}
