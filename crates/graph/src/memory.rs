//! In-memory ads platform. Hands out sequential ids, records every call and
//! can be told to reject chosen operations. Backs dry runs and tests.

use std::sync::atomic::{AtomicU64, Ordering};

use adlaunch_core::campaign::{AdSetBudget, CampaignBudget, NewAdSet, NewCampaign};
use adlaunch_core::types::{MediaAsset, MediaKind};
use adlaunch_core::RemoteApiError;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::client::{
    AdPlatformClient, AdRequest, CreativeRequest, GeoLocation, LocationType, MediaHandle, ReadyStatus,
    RemoteAd, RemoteAdAccount, RemoteAdSet, RemoteCampaign, RemotePage, RemotePixel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateCampaign,
    CreateAdSet,
    UploadImage,
    UploadVideo,
    MediaStatus,
    CreateCreative,
    CreateAd,
    ListCampaigns,
    ListAdSets,
    ListAds,
    ListAdAccounts,
    ListPages,
    ListPixels,
    SearchLocations,
}

/// One call observed by the platform, with the id or name it concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub subject: String,
}

pub struct InMemoryPlatform {
    next_id: AtomicU64,
    calls: Mutex<Vec<RecordedCall>>,
    failing_operations: DashMap<Operation, String>,
    failing_assets: DashMap<String, String>,
    polls_before_ready: AtomicU64,
    video_polls: DashMap<String, u64>,
    campaigns: Mutex<Vec<RemoteCampaign>>,
    ad_sets: Mutex<Vec<RemoteAdSet>>,
    creatives: Mutex<Vec<CreativeRequest>>,
    ads: Mutex<Vec<AdRequest>>,
    remote_ads: Mutex<Vec<RemoteAd>>,
    ad_accounts: Mutex<Vec<RemoteAdAccount>>,
    pages: Mutex<Vec<RemotePage>>,
    pixels: Mutex<Vec<RemotePixel>>,
    locations: Mutex<Vec<GeoLocation>>,
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            failing_operations: DashMap::new(),
            failing_assets: DashMap::new(),
            polls_before_ready: AtomicU64::new(0),
            video_polls: DashMap::new(),
            campaigns: Mutex::new(Vec::new()),
            ad_sets: Mutex::new(Vec::new()),
            creatives: Mutex::new(Vec::new()),
            ads: Mutex::new(Vec::new()),
            remote_ads: Mutex::new(Vec::new()),
            ad_accounts: Mutex::new(Vec::new()),
            pages: Mutex::new(Vec::new()),
            pixels: Mutex::new(Vec::new()),
            locations: Mutex::new(Vec::new()),
        }
    }

    // ─── Seeding ───

    pub fn add_ad_account(&self, account: RemoteAdAccount) {
        self.ad_accounts.lock().push(account);
    }

    pub fn add_page(&self, page: RemotePage) {
        self.pages.lock().push(page);
    }

    pub fn add_pixel(&self, pixel: RemotePixel) {
        self.pixels.lock().push(pixel);
    }

    /// Make a location discoverable by `search_locations`.
    pub fn add_location(&self, location: GeoLocation) {
        self.locations.lock().push(location);
    }

    /// Reject every call of `operation` with `message`.
    pub fn fail_operation(&self, operation: Operation, message: impl Into<String>) {
        self.failing_operations.insert(operation, message.into());
    }

    /// Reject uploads of one media asset.
    pub fn fail_asset(&self, asset_id: impl Into<String>, message: impl Into<String>) {
        self.failing_assets.insert(asset_id.into(), message.into());
    }

    /// Number of status polls a video needs before it reports ready.
    pub fn set_video_polls_before_ready(&self, polls: u64) {
        self.polls_before_ready.store(polls, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.calls.lock().iter().filter(|c| c.operation == operation).count()
    }

    pub fn creatives(&self) -> Vec<CreativeRequest> {
        self.creatives.lock().clone()
    }

    pub fn ads(&self) -> Vec<AdRequest> {
        self.ads.lock().clone()
    }

    fn record(&self, operation: Operation, subject: &str) -> Result<(), RemoteApiError> {
        self.calls.lock().push(RecordedCall {
            operation,
            subject: subject.to_string(),
        });
        debug!(?operation, subject, "In-memory platform call");
        match self.failing_operations.get(&operation) {
            Some(message) => Err(RemoteApiError::new(message.value().clone()).with_status(400)),
            None => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}_{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl AdPlatformClient for InMemoryPlatform {
    fn platform_name(&self) -> &'static str {
        "in_memory"
    }

    async fn create_campaign(
        &self,
        campaign: &NewCampaign,
        budget: &CampaignBudget,
    ) -> Result<String, RemoteApiError> {
        self.record(Operation::CreateCampaign, &campaign.name)?;
        let id = self.next_id("cmp");
        let daily_budget = match budget {
            CampaignBudget::Daily { amount } => {
                Some(adlaunch_core::campaign::to_minor_units(*amount).to_string())
            }
            CampaignBudget::AdSetManaged => None,
        };
        self.campaigns.lock().push(RemoteCampaign {
            id: id.clone(),
            name: campaign.name.clone(),
            objective: serde_json::to_value(campaign.objective)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string)),
            status: Some(campaign.status.as_str().to_string()),
            daily_budget,
        });
        Ok(id)
    }

    async fn create_ad_set(
        &self,
        ad_set: &NewAdSet,
        campaign_id: &str,
        _budget: &AdSetBudget,
    ) -> Result<String, RemoteApiError> {
        self.record(Operation::CreateAdSet, &ad_set.name)?;
        let id = self.next_id("adset");
        self.ad_sets.lock().push(RemoteAdSet {
            id: id.clone(),
            name: ad_set.name.clone(),
            campaign_id: Some(campaign_id.to_string()),
            status: Some(ad_set.status.as_str().to_string()),
        });
        Ok(id)
    }

    async fn upload_media(&self, asset: &MediaAsset) -> Result<MediaHandle, RemoteApiError> {
        let (operation, ready, prefix) = match asset.kind {
            MediaKind::Image => (Operation::UploadImage, ReadyStatus::Ready, "img"),
            MediaKind::Video => (Operation::UploadVideo, ReadyStatus::Processing, "vid"),
        };
        self.record(operation, &asset.id)?;
        if let Some(message) = self.failing_assets.get(&asset.id) {
            return Err(RemoteApiError::new(message.value().clone()).with_status(400));
        }
        Ok(MediaHandle {
            asset_id: asset.id.clone(),
            kind: asset.kind,
            remote_id: self.next_id(prefix),
            ready,
            thumbnail_url: None,
        })
    }

    async fn media_status(&self, handle: &MediaHandle) -> Result<MediaHandle, RemoteApiError> {
        self.record(Operation::MediaStatus, &handle.remote_id)?;
        if handle.kind == MediaKind::Image {
            return Ok(MediaHandle {
                ready: ReadyStatus::Ready,
                ..handle.clone()
            });
        }
        let mut polls = self.video_polls.entry(handle.remote_id.clone()).or_insert(0);
        *polls += 1;
        let ready = if *polls > self.polls_before_ready.load(Ordering::SeqCst) {
            ReadyStatus::Ready
        } else {
            ReadyStatus::Processing
        };
        Ok(MediaHandle {
            ready,
            ..handle.clone()
        })
    }

    async fn create_creative(&self, request: &CreativeRequest) -> Result<String, RemoteApiError> {
        self.record(Operation::CreateCreative, &request.name)?;
        self.creatives.lock().push(request.clone());
        Ok(self.next_id("creative"))
    }

    async fn create_ad(&self, request: &AdRequest) -> Result<String, RemoteApiError> {
        self.record(Operation::CreateAd, &request.name)?;
        let id = self.next_id("ad");
        self.ads.lock().push(request.clone());
        self.remote_ads.lock().push(RemoteAd {
            id: id.clone(),
            name: request.name.clone(),
            status: Some(request.status.as_str().to_string()),
        });
        Ok(id)
    }

    async fn list_campaigns(&self) -> Result<Vec<RemoteCampaign>, RemoteApiError> {
        self.record(Operation::ListCampaigns, "")?;
        Ok(self.campaigns.lock().clone())
    }

    async fn list_ad_sets(&self, campaign_id: Option<&str>) -> Result<Vec<RemoteAdSet>, RemoteApiError> {
        self.record(Operation::ListAdSets, campaign_id.unwrap_or_default())?;
        Ok(self
            .ad_sets
            .lock()
            .iter()
            .filter(|a| campaign_id.is_none() || a.campaign_id.as_deref() == campaign_id)
            .cloned()
            .collect())
    }

    async fn list_ads(&self, ad_set_id: &str) -> Result<Vec<RemoteAd>, RemoteApiError> {
        self.record(Operation::ListAds, ad_set_id)?;
        let ads = self.ads.lock();
        let remote = self.remote_ads.lock();
        Ok(ads
            .iter()
            .zip(remote.iter())
            .filter(|(request, _)| request.ad_set_id == ad_set_id)
            .map(|(_, ad)| ad.clone())
            .collect())
    }

    async fn list_ad_accounts(&self) -> Result<Vec<RemoteAdAccount>, RemoteApiError> {
        self.record(Operation::ListAdAccounts, "")?;
        Ok(self.ad_accounts.lock().clone())
    }

    async fn list_pages(&self) -> Result<Vec<RemotePage>, RemoteApiError> {
        self.record(Operation::ListPages, "")?;
        Ok(self.pages.lock().clone())
    }

    async fn list_pixels(&self) -> Result<Vec<RemotePixel>, RemoteApiError> {
        self.record(Operation::ListPixels, "")?;
        Ok(self.pixels.lock().clone())
    }

    async fn search_locations(
        &self,
        query: &str,
        location_type: LocationType,
        limit: u32,
    ) -> Result<Vec<GeoLocation>, RemoteApiError> {
        self.record(Operation::SearchLocations, query)?;
        let needle = query.to_lowercase();
        Ok(self
            .locations
            .lock()
            .iter()
            .filter(|l| l.location_type.as_deref() == Some(location_type.as_str()))
            .filter(|l| l.name.to_lowercase().contains(&needle))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
