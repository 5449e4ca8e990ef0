//! Sequential submission engine.
//!
//! Specs are processed one at a time in expansion order. Each item uploads
//! its media, creates a creative and then an ad. A failing item is recorded
//! and the loop moves on, so the result list always matches the spec list.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use adlaunch_core::campaign::EntityStatus;
use adlaunch_core::config::PipelineConfig;
use adlaunch_core::records::{AdRecordSink, LocalAdRecord};
use adlaunch_core::types::{
    AdSpecification, CreativeTemplate, MediaAsset, ParentResourceRefs, SubmissionResult,
};
use adlaunch_core::{LaunchError, LaunchResult};
use adlaunch_graph::{AdPlatformClient, AdRequest, CreativeRequest, MediaHandle};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::progress::ProgressTracker;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub video_ready_timeout: Duration,
    pub video_poll_interval: Duration,
    pub ad_status: EntityStatus,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            video_ready_timeout: Duration::from_secs(600),
            video_poll_interval: Duration::from_secs(5),
            ad_status: EntityStatus::Paused,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &PipelineConfig) -> LaunchResult<Self> {
        let ad_status = match config.ad_status.trim().to_ascii_uppercase().as_str() {
            "PAUSED" => EntityStatus::Paused,
            "ACTIVE" => EntityStatus::Active,
            other => {
                return Err(LaunchError::Config(format!(
                    "unsupported ad status '{other}', expected PAUSED or ACTIVE"
                )))
            }
        };
        if config.video_poll_interval_ms == 0 {
            return Err(LaunchError::Config("video_poll_interval_ms must be greater than zero".into()));
        }
        if config.video_ready_timeout_secs == 0 {
            return Err(LaunchError::Config("video_ready_timeout_secs must be greater than zero".into()));
        }
        Ok(Self {
            video_ready_timeout: Duration::from_secs(config.video_ready_timeout_secs),
            video_poll_interval: Duration::from_millis(config.video_poll_interval_ms),
            ad_status,
        })
    }
}

/// Copy and media shared by every item of a run.
struct RunContext<'a> {
    media: HashMap<&'a str, &'a MediaAsset>,
    headlines: Vec<String>,
    bodies: Vec<String>,
    parents: &'a ParentResourceRefs,
    template: &'a CreativeTemplate,
}

struct Submitted {
    creative_id: String,
    ad_id: String,
}

pub struct SubmissionEngine {
    client: Arc<dyn AdPlatformClient>,
    records: Arc<dyn AdRecordSink>,
    settings: EngineSettings,
}

impl SubmissionEngine {
    pub fn new(
        client: Arc<dyn AdPlatformClient>,
        records: Arc<dyn AdRecordSink>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            client,
            records,
            settings,
        }
    }

    /// Submit every spec in order and return one result per spec.
    pub async fn submit_all(
        &self,
        specs: &[AdSpecification],
        media: &[MediaAsset],
        parents: &ParentResourceRefs,
        template: &CreativeTemplate,
        tracker: &mut ProgressTracker,
    ) -> Vec<SubmissionResult> {
        let ctx = RunContext {
            media: media.iter().map(|m| (m.id.as_str(), m)).collect(),
            headlines: template.headline_options(),
            bodies: template.body_options(),
            parents,
            template,
        };

        let mut results = Vec::with_capacity(specs.len());
        for spec in specs {
            tracker.on_item_start(spec);
            let result = match self.submit_one(spec, &ctx).await {
                Ok(done) => {
                    metrics::counter!("bulk.ads.created").increment(1);
                    info!(
                        spec_id = %spec.id,
                        display_name = %spec.display_name,
                        ad_id = %done.ad_id,
                        "Ad created"
                    );
                    SubmissionResult::success(spec, done.creative_id, done.ad_id)
                }
                Err(e) => {
                    metrics::counter!("bulk.ads.failed").increment(1);
                    warn!(
                        spec_id = %spec.id,
                        display_name = %spec.display_name,
                        error = %e,
                        "Ad submission failed"
                    );
                    SubmissionResult::failure(spec, &e)
                }
            };
            tracker.on_item_done(result.clone());
            results.push(result);
        }
        results
    }

    async fn submit_one(&self, spec: &AdSpecification, ctx: &RunContext<'_>) -> LaunchResult<Submitted> {
        let asset = ctx
            .media
            .get(spec.media_asset_id.as_str())
            .copied()
            .ok_or_else(|| LaunchError::MediaNotFound(spec.media_asset_id.clone()))?;
        let page_id = ctx.template.page_id().ok_or(LaunchError::MissingPageId)?;
        let headline = copy_variant(&ctx.headlines, spec.headline_index, "headline")?;
        let body = copy_variant(&ctx.bodies, spec.body_index, "body")?;

        let uploaded = self.client.upload_media(asset).await?;
        let handle = self.wait_until_ready(uploaded).await?;

        let creative_id = self
            .client
            .create_creative(&CreativeRequest {
                name: ctx.template.creative_name.clone(),
                page_id: page_id.to_string(),
                instagram_actor_id: ctx.template.instagram_actor_id().map(str::to_string),
                media: handle,
                headline: headline.to_string(),
                body: body.to_string(),
                description: ctx.template.description.clone(),
                call_to_action: ctx.template.call_to_action,
                link: ctx.template.destination_url.trim().to_string(),
            })
            .await?;
        debug!(spec_id = %spec.id, creative_id = %creative_id, "Creative created");

        let ad_id = self
            .client
            .create_ad(&AdRequest {
                name: spec.display_name.clone(),
                ad_set_id: ctx.parents.ad_set_remote_id.clone(),
                creative_id: creative_id.clone(),
                status: self.settings.ad_status,
            })
            .await?;

        self.persist_record(spec, asset, ctx, &creative_id, &ad_id).await;

        Ok(Submitted { creative_id, ad_id })
    }

    /// Poll until the media is ready, bounded by the configured timeout.
    async fn wait_until_ready(&self, handle: MediaHandle) -> LaunchResult<MediaHandle> {
        if handle.is_ready() {
            return Ok(handle);
        }
        let media_id = handle.remote_id.clone();
        let timeout = self.settings.video_ready_timeout;
        info!(media_id = %media_id, timeout_secs = timeout.as_secs(), "Waiting for video processing");

        match tokio::time::timeout(timeout, self.poll_until_ready(handle)).await {
            Ok(result) => result,
            Err(_) => Err(LaunchError::MediaProcessingTimeout {
                media_id,
                waited_secs: timeout.as_secs(),
            }),
        }
    }

    async fn poll_until_ready(&self, mut handle: MediaHandle) -> LaunchResult<MediaHandle> {
        while !handle.is_ready() {
            tokio::time::sleep(self.settings.video_poll_interval).await;
            handle = self.client.media_status(&handle).await?;
        }
        Ok(handle)
    }

    /// Best-effort local bookkeeping. The remote ad stays authoritative.
    async fn persist_record(
        &self,
        spec: &AdSpecification,
        asset: &MediaAsset,
        ctx: &RunContext<'_>,
        creative_id: &str,
        ad_id: &str,
    ) {
        let record = LocalAdRecord {
            id: spec.id.clone(),
            ad_set_id: ctx.parents.ad_set_remote_id.clone(),
            name: spec.display_name.clone(),
            creative_name: ctx.template.creative_name.clone(),
            media_url: asset.source.reference(),
            headlines: ctx.headlines.clone(),
            bodies: ctx.bodies.clone(),
            description: ctx.template.description.clone(),
            cta: ctx.template.call_to_action,
            website_url: ctx.template.destination_url.trim().to_string(),
            status: self.settings.ad_status,
            remote_ad_id: ad_id.to_string(),
            remote_creative_id: creative_id.to_string(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.records.persist(record).await {
            metrics::counter!("bulk.records.persist_failed").increment(1);
            warn!(spec_id = %spec.id, ad_id, error = %e, "Failed to persist local ad record");
        }
    }
}

fn copy_variant<'a>(options: &'a [String], index: usize, field: &str) -> LaunchResult<&'a str> {
    options.get(index).map(String::as_str).ok_or_else(|| {
        LaunchError::Validation(format!("{field} index {index} is out of range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use adlaunch_core::campaign::BudgetType;
    use adlaunch_core::records::DiscardRecords;
    use adlaunch_core::types::{CallToAction, MediaSource, SubmissionOutcome};
    use adlaunch_graph::{InMemoryPlatform, Operation};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::expander::PermutationExpander;

    fn asset(id: &str, file: &str) -> MediaAsset {
        MediaAsset::from_source(
            id,
            id,
            MediaSource::RemoteUrl {
                url: format!("https://cdn.example.com/{file}").parse().unwrap(),
            },
        )
    }

    fn template() -> CreativeTemplate {
        CreativeTemplate {
            creative_name: "Spring".into(),
            headlines: vec!["Buy now".into(), "".into(), "Limited time".into()],
            bodies: vec!["Great product".into()],
            description: Some("Free shipping".into()),
            call_to_action: CallToAction::ShopNow,
            destination_url: "https://shop.example.com".into(),
            page_id: Some("page_1".into()),
            instagram_actor_id: None,
        }
    }

    fn parents() -> ParentResourceRefs {
        ParentResourceRefs {
            campaign_remote_id: "cmp_1".into(),
            ad_set_remote_id: "adset_1".into(),
            budget_type: BudgetType::CampaignBudget,
        }
    }

    fn fast_settings() -> EngineSettings {
        EngineSettings {
            video_ready_timeout: Duration::from_millis(200),
            video_poll_interval: Duration::from_millis(5),
            ad_status: EntityStatus::Paused,
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        records: Mutex<Vec<LocalAdRecord>>,
    }

    #[async_trait]
    impl AdRecordSink for CollectingSink {
        async fn persist(&self, record: LocalAdRecord) -> LaunchResult<()> {
            self.records.lock().push(record);
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AdRecordSink for FailingSink {
        async fn persist(&self, _record: LocalAdRecord) -> LaunchResult<()> {
            Err(LaunchError::LocalPersistence("store offline".into()))
        }
    }

    #[tokio::test]
    async fn test_middle_failure_does_not_stop_the_batch() {
        let platform = Arc::new(InMemoryPlatform::new());
        platform.fail_asset("m2", "Image too small");
        let engine = SubmissionEngine::new(platform.clone(), Arc::new(DiscardRecords), fast_settings());

        let media = vec![asset("m1", "a.png"), asset("m2", "b.png"), asset("m3", "c.png")];
        let mut t = template();
        t.headlines = vec!["Buy now".into()];
        let specs = PermutationExpander::new().expand_template(&media, &t).unwrap();
        let mut tracker = ProgressTracker::new();
        tracker.on_run_start(specs.len());

        let results = engine.submit_all(&specs, &media, &parents(), &t, &mut tracker).await;
        let outcomes: Vec<_> = results.iter().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            vec![SubmissionOutcome::Success, SubmissionOutcome::Failure, SubmissionOutcome::Success]
        );
        assert_eq!(
            results[1].error_message.as_deref(),
            Some("Failed to create m2 - H1B1: Image too small")
        );
        assert_eq!(tracker.progress().completed_count, 3);
        assert_eq!(platform.count(Operation::CreateAd), 2);
    }

    #[tokio::test]
    async fn test_creatives_use_each_specs_copy() {
        let platform = Arc::new(InMemoryPlatform::new());
        let sink = Arc::new(CollectingSink::default());
        let engine = SubmissionEngine::new(platform.clone(), sink.clone(), fast_settings());
        let media = vec![asset("m1", "a.png")];
        let t = template();
        let specs = PermutationExpander::new().expand_template(&media, &t).unwrap();
        let mut tracker = ProgressTracker::new();

        engine.submit_all(&specs, &media, &parents(), &t, &mut tracker).await;

        let headlines: Vec<_> = platform.creatives().into_iter().map(|c| c.headline).collect();
        assert_eq!(headlines, vec!["Buy now", "Limited time"]);
        let ads = platform.ads();
        assert!(ads.iter().all(|a| a.ad_set_id == "adset_1"));
        assert_eq!(ads[1].name, "m1 - H2B1");

        let records = sink.records.lock();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].headlines, vec!["Buy now", "Limited time"]);
        assert_eq!(records[0].media_url, "https://cdn.example.com/a.png");
        assert_eq!(records[0].id, specs[0].id);
    }

    #[tokio::test]
    async fn test_missing_page_id_fails_without_remote_calls() {
        let platform = Arc::new(InMemoryPlatform::new());
        let engine = SubmissionEngine::new(platform.clone(), Arc::new(DiscardRecords), fast_settings());
        let media = vec![asset("m1", "a.png")];
        let mut t = template();
        t.page_id = Some("  ".into());
        let specs = PermutationExpander::new().expand_template(&media, &t).unwrap();
        let mut tracker = ProgressTracker::new();

        let results = engine.submit_all(&specs, &media, &parents(), &t, &mut tracker).await;
        assert_eq!(results.len(), specs.len());
        assert!(results.iter().all(|r| !r.is_success()));
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_video_waits_for_processing() {
        let platform = Arc::new(InMemoryPlatform::new());
        platform.set_video_polls_before_ready(2);
        let engine = SubmissionEngine::new(platform.clone(), Arc::new(DiscardRecords), fast_settings());
        let media = vec![asset("v1", "promo.mp4")];
        let mut t = template();
        t.headlines = vec!["Buy now".into()];
        let specs = PermutationExpander::new().expand_template(&media, &t).unwrap();
        let mut tracker = ProgressTracker::new();

        let results = engine.submit_all(&specs, &media, &parents(), &t, &mut tracker).await;
        assert!(results[0].is_success());
        assert_eq!(platform.count(Operation::MediaStatus), 3);
    }

    #[tokio::test]
    async fn test_video_timeout_is_per_item() {
        let platform = Arc::new(InMemoryPlatform::new());
        platform.set_video_polls_before_ready(u64::MAX);
        let engine = SubmissionEngine::new(platform.clone(), Arc::new(DiscardRecords), fast_settings());
        let media = vec![asset("v1", "promo.mp4"), asset("m1", "a.png")];
        let mut t = template();
        t.headlines = vec!["Buy now".into()];
        let specs = PermutationExpander::new().expand_template(&media, &t).unwrap();
        let mut tracker = ProgressTracker::new();

        let results = engine.submit_all(&specs, &media, &parents(), &t, &mut tracker).await;
        assert!(!results[0].is_success());
        assert!(results[0]
            .error_message
            .as_deref()
            .unwrap_or_default()
            .contains("was not ready"));
        assert!(results[1].is_success());
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_success() {
        let platform = Arc::new(InMemoryPlatform::new());
        let engine = SubmissionEngine::new(platform.clone(), Arc::new(FailingSink), fast_settings());
        let media = vec![asset("m1", "a.png")];
        let mut t = template();
        t.headlines = vec!["Buy now".into()];
        let specs = PermutationExpander::new().expand_template(&media, &t).unwrap();
        let mut tracker = ProgressTracker::new();

        let results = engine.submit_all(&specs, &media, &parents(), &t, &mut tracker).await;
        assert!(results[0].is_success());
        assert!(results[0].remote_ad_id.is_some());
    }

    #[test]
    fn test_settings_from_config() {
        let cfg = PipelineConfig {
            video_ready_timeout_secs: 30,
            video_poll_interval_ms: 250,
            ad_status: "active".into(),
        };
        let settings = EngineSettings::from_config(&cfg).unwrap();
        assert_eq!(settings.video_ready_timeout, Duration::from_secs(30));
        assert_eq!(settings.ad_status, EntityStatus::Active);

        let bad = PipelineConfig {
            ad_status: "ARCHIVED".into(),
            ..cfg
        };
        assert!(EngineSettings::from_config(&bad).is_err());
    }

    #[test]
    fn test_zero_video_timings_are_rejected() {
        let cfg = PipelineConfig {
            video_ready_timeout_secs: 30,
            video_poll_interval_ms: 0,
            ad_status: "PAUSED".into(),
        };
        let err = EngineSettings::from_config(&cfg).unwrap_err();
        assert!(matches!(err, LaunchError::Config(ref m) if m.contains("video_poll_interval_ms")));

        let cfg = PipelineConfig {
            video_ready_timeout_secs: 0,
            video_poll_interval_ms: 250,
            ..cfg
        };
        let err = EngineSettings::from_config(&cfg).unwrap_err();
        assert!(matches!(err, LaunchError::Config(ref m) if m.contains("video_ready_timeout_secs")));
    }
}
