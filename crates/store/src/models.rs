//! Record store domain types: brands, products, customer profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Brand ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    pub colors: BrandColors,
    pub voice: Option<String>,
    pub products: Vec<Product>,
    pub profile_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrandColors {
    pub primary: String,
    pub secondary: String,
    #[serde(default = "default_highlight")]
    pub highlight: String,
}

fn default_highlight() -> String {
    "#F59E0B".to_string()
}

impl Default for BrandColors {
    fn default() -> Self {
        Self {
            primary: "#111827".to_string(),
            secondary: "#FFFFFF".to_string(),
            highlight: default_highlight(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial product update; absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBrandRequest {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub colors: BrandColors,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub products: Vec<ProductInput>,
    #[serde(default)]
    pub profile_ids: Vec<Uuid>,
}

/// Partial update. `products` and `profile_ids`, when present, replace the
/// brand's current lists wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBrandRequest {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub colors: Option<BrandColors>,
    pub voice: Option<String>,
    pub products: Option<Vec<ProductInput>>,
    pub profile_ids: Option<Vec<Uuid>>,
}

// ─── Customer profile ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub id: Uuid,
    pub name: String,
    pub demographics: String,
    pub pain_points: String,
    pub goals: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub demographics: String,
    #[serde(default)]
    pub pain_points: String,
    #[serde(default)]
    pub goals: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub demographics: Option<String>,
    pub pain_points: Option<String>,
    pub goals: Option<String>,
}

// ─── Ad records ────────────────────────────────────────────────────────────

/// Per-record outcome of a bulk insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsertedRecord {
    pub id: String,
    pub success: bool,
}

/// Reply to saving a campaign or ad set record. `created` is false when a
/// record with the same id was already stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedRecord {
    pub id: String,
    pub created: bool,
}
