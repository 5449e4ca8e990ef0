//! Graph marketing API client.
//! One request per call, no retries. Errors come back as `RemoteApiError`.

use std::collections::HashSet;
use std::time::Duration;

use adlaunch_core::campaign::{AdSetBudget, CampaignBudget, NewAdSet, NewCampaign};
use adlaunch_core::config::PlatformConfig;
use adlaunch_core::types::{MediaAsset, MediaKind, MediaSource};
use adlaunch_core::{LaunchError, LaunchResult, RemoteApiError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::{
    AdPlatformClient, AdRequest, CreativeRequest, GeoLocation, LocationType, MediaHandle, ReadyStatus,
    RemoteAd, RemoteAdAccount, RemoteAdSet, RemoteCampaign, RemotePage, RemotePixel,
};
use crate::media;
use crate::payload::{AdPayload, AdSetPayload, CampaignPayload, CreativePayload};

const PAGE_LIMIT: &str = "100";
/// Upper bound on pages followed by one listing.
const MAX_PAGES: usize = 50;

pub struct GraphApiClient {
    http: reqwest::Client,
    /// `{base_url}/{api_version}`
    api_root: String,
    access_token: String,
    ad_account_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error_user_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoStatusResponse {
    #[serde(default)]
    status: Option<VideoStatus>,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoStatus {
    #[serde(default)]
    video_status: String,
}

#[derive(Serialize)]
struct VideoUrlUpload<'a> {
    file_url: &'a str,
    name: &'a str,
}

impl GraphApiClient {
    pub fn new(config: &PlatformConfig) -> LaunchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LaunchError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_root: format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.api_version.trim_matches('/')
            ),
            access_token: config.access_token.clone(),
            ad_account_id: config.normalized_ad_account_id(),
        })
    }

    fn account_edge(&self, edge: &str) -> String {
        format!("{}/{}/{}", self.api_root, self.ad_account_id, edge)
    }

    fn node(&self, id: &str) -> String {
        format!("{}/{}", self.api_root, id)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, edge: &str, body: &B) -> Result<String, RemoteApiError> {
        let request = self
            .http
            .post(self.account_edge(edge))
            .query(&[("access_token", self.access_token.as_str())])
            .json(body);
        let created: CreatedId = self.execute(edge, request).await?;
        Ok(created.id)
    }

    /// Send a request and decode its JSON body, extracting platform errors.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RemoteApiError> {
        metrics::counter!("graph.requests", "operation" => operation.to_string()).increment(1);
        let response = request.send().await.map_err(|e| {
            metrics::counter!("graph.transport_errors").increment(1);
            RemoteApiError::new(format!("Request to {operation} failed: {e}"))
        })?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteApiError::new(format!("Failed to read {operation} response: {e}")))?;

        if let Ok(ErrorEnvelope { error: Some(error) }) = serde_json::from_slice::<ErrorEnvelope>(&bytes) {
            warn!(operation, status = status.as_u16(), error = %error.message, "Platform rejected request");
            let mut err = RemoteApiError::new(error.message).with_status(status.as_u16());
            if let Some(user) = error.error_user_msg {
                err = err.with_user_message(user);
            }
            return Err(err);
        }
        if !status.is_success() {
            return Err(
                RemoteApiError::new(format!("{operation} failed with status {status}"))
                    .with_status(status.as_u16()),
            );
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            RemoteApiError::new(format!("Unexpected {operation} response: {e}")).with_status(status.as_u16())
        })
    }

    /// Follow `paging.next` until the listing is exhausted. A cursor that
    /// repeats or runs past `MAX_PAGES` fails the listing.
    async fn list_all<T: DeserializeOwned>(
        &self,
        operation: &str,
        first: reqwest::RequestBuilder,
    ) -> Result<Vec<T>, RemoteApiError> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut page: Page<T> = self.execute(operation, first).await?;
        let mut fetched = 1;
        loop {
            items.append(&mut page.data);
            let Some(next) = page.paging.and_then(|p| p.next) else {
                break;
            };
            if !visited.insert(next.clone()) {
                warn!(operation, "Paging cursor repeated");
                return Err(RemoteApiError::new(format!(
                    "Pagination of {operation} looped back to an already fetched page"
                )));
            }
            if fetched >= MAX_PAGES {
                warn!(operation, pages = fetched, "Paging limit reached");
                return Err(RemoteApiError::new(format!(
                    "Pagination of {operation} exceeded {MAX_PAGES} pages"
                )));
            }
            page = self.execute(operation, self.http.get(next)).await?;
            fetched += 1;
        }
        debug!(operation, count = items.len(), "Listing complete");
        Ok(items)
    }

    async fn upload_image(&self, asset: &MediaAsset) -> Result<MediaHandle, RemoteApiError> {
        #[derive(Deserialize)]
        struct ImageUpload {
            images: std::collections::HashMap<String, ImageEntry>,
        }
        #[derive(Deserialize)]
        struct ImageEntry {
            hash: String,
        }

        let bytes = media::load_bytes(&self.http, &asset.source).await?;
        let encoded = media::encode_base64(&bytes);
        let request = self
            .http
            .post(self.account_edge("adimages"))
            .form(&[("access_token", self.access_token.as_str()), ("bytes", encoded.as_str())]);
        let upload: ImageUpload = self.execute("adimages", request).await?;
        let hash = upload
            .images
            .get("bytes")
            .or_else(|| upload.images.values().next())
            .map(|entry| entry.hash.clone())
            .ok_or_else(|| RemoteApiError::new("Image upload response did not contain a hash"))?;

        Ok(MediaHandle {
            asset_id: asset.id.clone(),
            kind: MediaKind::Image,
            remote_id: hash,
            ready: ReadyStatus::Ready,
            thumbnail_url: None,
        })
    }

    async fn upload_video(&self, asset: &MediaAsset) -> Result<MediaHandle, RemoteApiError> {
        let video_id = match &asset.source {
            MediaSource::RemoteUrl { url } => {
                self.post_json(
                    "advideos",
                    &VideoUrlUpload {
                        file_url: url.as_str(),
                        name: &asset.display_name,
                    },
                )
                .await?
            }
            MediaSource::LocalFile { .. } => {
                let bytes = media::load_bytes(&self.http, &asset.source).await?;
                let part = Part::bytes(bytes).file_name(media::file_name(&asset.source, &asset.display_name));
                let form = Form::new()
                    .text("access_token", self.access_token.clone())
                    .text("name", asset.display_name.clone())
                    .part("source", part);
                let request = self.http.post(self.account_edge("advideos")).multipart(form);
                let created: CreatedId = self.execute("advideos", request).await?;
                created.id
            }
        };

        Ok(MediaHandle {
            asset_id: asset.id.clone(),
            kind: MediaKind::Video,
            remote_id: video_id,
            ready: ReadyStatus::Processing,
            thumbnail_url: None,
        })
    }
}

#[async_trait]
impl AdPlatformClient for GraphApiClient {
    fn platform_name(&self) -> &'static str {
        "facebook_graph"
    }

    async fn create_campaign(
        &self,
        campaign: &NewCampaign,
        budget: &CampaignBudget,
    ) -> Result<String, RemoteApiError> {
        let id = self.post_json("campaigns", &CampaignPayload::build(campaign, budget)).await?;
        info!(campaign_id = %id, name = %campaign.name, "Campaign created");
        Ok(id)
    }

    async fn create_ad_set(
        &self,
        ad_set: &NewAdSet,
        campaign_id: &str,
        budget: &AdSetBudget,
    ) -> Result<String, RemoteApiError> {
        let payload = AdSetPayload::build(ad_set, campaign_id, budget);
        let id = self.post_json("adsets", &payload).await?;
        info!(ad_set_id = %id, campaign_id, name = %ad_set.name, "Ad set created");
        Ok(id)
    }

    async fn upload_media(&self, asset: &MediaAsset) -> Result<MediaHandle, RemoteApiError> {
        debug!(asset_id = %asset.id, kind = ?asset.kind, "Uploading media");
        match asset.kind {
            MediaKind::Image => self.upload_image(asset).await,
            MediaKind::Video => self.upload_video(asset).await,
        }
    }

    async fn media_status(&self, handle: &MediaHandle) -> Result<MediaHandle, RemoteApiError> {
        if handle.kind == MediaKind::Image {
            return Ok(MediaHandle {
                ready: ReadyStatus::Ready,
                ..handle.clone()
            });
        }

        let request = self
            .http
            .get(self.node(&handle.remote_id))
            .query(&[("fields", "status,picture"), ("access_token", self.access_token.as_str())]);
        let response: VideoStatusResponse = self.execute("video_status", request).await?;
        let status = response.status.map(|s| s.video_status).unwrap_or_default();
        let ready = match status.as_str() {
            "ready" => ReadyStatus::Ready,
            "error" => {
                return Err(RemoteApiError::new(format!(
                    "Video {} failed processing on the platform",
                    handle.remote_id
                )))
            }
            _ => ReadyStatus::Processing,
        };
        Ok(MediaHandle {
            ready,
            thumbnail_url: response.picture.or_else(|| handle.thumbnail_url.clone()),
            ..handle.clone()
        })
    }

    async fn create_creative(&self, request: &CreativeRequest) -> Result<String, RemoteApiError> {
        self.post_json("adcreatives", &CreativePayload::build(request)).await
    }

    async fn create_ad(&self, request: &AdRequest) -> Result<String, RemoteApiError> {
        self.post_json("ads", &AdPayload::build(request)).await
    }

    async fn list_campaigns(&self) -> Result<Vec<RemoteCampaign>, RemoteApiError> {
        let request = self.http.get(self.account_edge("campaigns")).query(&[
            ("fields", "id,name,objective,status,daily_budget"),
            ("limit", PAGE_LIMIT),
            ("access_token", self.access_token.as_str()),
        ]);
        self.list_all("list_campaigns", request).await
    }

    async fn list_ad_sets(&self, campaign_id: Option<&str>) -> Result<Vec<RemoteAdSet>, RemoteApiError> {
        let url = match campaign_id {
            Some(id) => format!("{}/adsets", self.node(id)),
            None => self.account_edge("adsets"),
        };
        let request = self.http.get(url).query(&[
            ("fields", "id,name,campaign_id,status"),
            ("limit", PAGE_LIMIT),
            ("access_token", self.access_token.as_str()),
        ]);
        self.list_all("list_ad_sets", request).await
    }

    async fn list_ads(&self, ad_set_id: &str) -> Result<Vec<RemoteAd>, RemoteApiError> {
        let request = self.http.get(format!("{}/ads", self.node(ad_set_id))).query(&[
            ("fields", "id,name,status"),
            ("limit", PAGE_LIMIT),
            ("access_token", self.access_token.as_str()),
        ]);
        self.list_all("list_ads", request).await
    }

    async fn list_ad_accounts(&self) -> Result<Vec<RemoteAdAccount>, RemoteApiError> {
        let request = self.http.get(self.node("me/adaccounts")).query(&[
            ("fields", "id,name,account_id,account_status,currency"),
            ("limit", PAGE_LIMIT),
            ("access_token", self.access_token.as_str()),
        ]);
        self.list_all("list_ad_accounts", request).await
    }

    async fn list_pages(&self) -> Result<Vec<RemotePage>, RemoteApiError> {
        let request = self.http.get(self.node("me/accounts")).query(&[
            ("fields", "id,name,category"),
            ("limit", PAGE_LIMIT),
            ("access_token", self.access_token.as_str()),
        ]);
        self.list_all("list_pages", request).await
    }

    async fn list_pixels(&self) -> Result<Vec<RemotePixel>, RemoteApiError> {
        let request = self.http.get(self.account_edge("adspixels")).query(&[
            ("fields", "id,name"),
            ("limit", PAGE_LIMIT),
            ("access_token", self.access_token.as_str()),
        ]);
        self.list_all("list_pixels", request).await
    }

    async fn search_locations(
        &self,
        query: &str,
        location_type: LocationType,
        limit: u32,
    ) -> Result<Vec<GeoLocation>, RemoteApiError> {
        let location_types = format!("[\"{}\"]", location_type.as_str());
        let limit = limit.to_string();
        let request = self.http.get(self.account_edge("targetingsearch")).query(&[
            ("q", query),
            ("type", "adgeolocation"),
            ("location_types", location_types.as_str()),
            ("limit", limit.as_str()),
            ("access_token", self.access_token.as_str()),
        ]);
        let page: Page<GeoLocation> = self.execute("search_locations", request).await?;
        Ok(page.data)
    }
}
