//! Client trait for the remote ads platform.
//! Every create call produces a new remote object; callers own deduplication.

use adlaunch_core::campaign::{AdSetBudget, BudgetType, CampaignBudget, EntityStatus, NewAdSet, NewCampaign};
use adlaunch_core::types::{CallToAction, MediaAsset, MediaKind};
use adlaunch_core::RemoteApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Processing state of uploaded media.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadyStatus {
    Ready,
    Processing,
}

/// Reference to media that now lives on the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaHandle {
    pub asset_id: String,
    pub kind: MediaKind,
    /// Image hash for images, video id for videos.
    pub remote_id: String,
    pub ready: ReadyStatus,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl MediaHandle {
    pub fn is_ready(&self) -> bool {
        self.ready == ReadyStatus::Ready
    }
}

/// Everything needed to create one creative.
#[derive(Debug, Clone)]
pub struct CreativeRequest {
    pub name: String,
    pub page_id: String,
    pub instagram_actor_id: Option<String>,
    pub media: MediaHandle,
    pub headline: String,
    pub body: String,
    pub description: Option<String>,
    pub call_to_action: CallToAction,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct AdRequest {
    pub name: String,
    pub ad_set_id: String,
    pub creative_id: String,
    pub status: EntityStatus,
}

/// Campaign summary returned by listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteCampaign {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Minor units, as a string, when the campaign carries its own budget.
    #[serde(default)]
    pub daily_budget: Option<String>,
}

impl RemoteCampaign {
    pub fn budget_type(&self) -> BudgetType {
        match self.daily_budget.as_deref() {
            Some(b) if !b.is_empty() && b != "0" => BudgetType::CampaignBudget,
            _ => BudgetType::AdSetBudget,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteAdSet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteAd {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Ad account reachable with the configured token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteAdAccount {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub account_status: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Page the token can publish creatives as. Page access tokens are not requested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemotePage {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemotePixel {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Location kinds accepted by targeting search.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Country,
    Region,
    #[default]
    City,
    Zip,
}

impl LocationType {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationType::Country => "country",
            LocationType::Region => "region",
            LocationType::City => "city",
            LocationType::Zip => "zip",
        }
    }
}

/// One geo-targeting search hit. `key` is what targeting specs reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub location_type: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

#[async_trait]
pub trait AdPlatformClient: Send + Sync {
    fn platform_name(&self) -> &'static str;

    async fn create_campaign(
        &self,
        campaign: &NewCampaign,
        budget: &CampaignBudget,
    ) -> Result<String, RemoteApiError>;

    async fn create_ad_set(
        &self,
        ad_set: &NewAdSet,
        campaign_id: &str,
        budget: &AdSetBudget,
    ) -> Result<String, RemoteApiError>;

    async fn upload_media(&self, asset: &MediaAsset) -> Result<MediaHandle, RemoteApiError>;

    /// Refresh the processing state of uploaded media.
    async fn media_status(&self, handle: &MediaHandle) -> Result<MediaHandle, RemoteApiError>;

    async fn create_creative(&self, request: &CreativeRequest) -> Result<String, RemoteApiError>;

    async fn create_ad(&self, request: &AdRequest) -> Result<String, RemoteApiError>;

    async fn list_campaigns(&self) -> Result<Vec<RemoteCampaign>, RemoteApiError>;

    async fn list_ad_sets(&self, campaign_id: Option<&str>) -> Result<Vec<RemoteAdSet>, RemoteApiError>;

    async fn list_ads(&self, ad_set_id: &str) -> Result<Vec<RemoteAd>, RemoteApiError>;

    async fn list_ad_accounts(&self) -> Result<Vec<RemoteAdAccount>, RemoteApiError>;

    async fn list_pages(&self) -> Result<Vec<RemotePage>, RemoteApiError>;

    async fn list_pixels(&self) -> Result<Vec<RemotePixel>, RemoteApiError>;

    /// Single page of at most `limit` matches; no paging.
    async fn search_locations(
        &self,
        query: &str,
        location_type: LocationType,
        limit: u32,
    ) -> Result<Vec<GeoLocation>, RemoteApiError>;
}
