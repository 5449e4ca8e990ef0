use std::sync::Arc;
use std::time::Duration;

use adlaunch_core::campaign::{
    AdSetInput, BudgetType, CampaignInput, EntityStatus, GeoLocations, NewAdSet, NewCampaign,
    Objective, OptimizationGoal, ParentInputs, Targeting,
};
use adlaunch_core::config::PlatformConfig;
use adlaunch_core::records::DiscardRecords;
use adlaunch_core::types::{CallToAction, CreativeTemplate, MediaAsset, MediaKind, MediaSource, SubmissionOutcome};
use adlaunch_graph::{GraphApiClient, InMemoryPlatform, Operation};
use adlaunch_pipeline::{BulkSubmission, BulkSubmissionRequest, EngineSettings, PermutationExpander, RunState};
use httpmock::prelude::*;
use serde_json::json;

fn settings() -> EngineSettings {
    EngineSettings {
        video_ready_timeout: Duration::from_millis(200),
        video_poll_interval: Duration::from_millis(5),
        ad_status: EntityStatus::Paused,
    }
}

fn template(headlines: &[&str], bodies: &[&str]) -> CreativeTemplate {
    CreativeTemplate {
        creative_name: "Spring Launch".into(),
        headlines: headlines.iter().map(|s| s.to_string()).collect(),
        bodies: bodies.iter().map(|s| s.to_string()).collect(),
        description: Some("Free shipping".into()),
        call_to_action: CallToAction::ShopNow,
        destination_url: "https://shop.example.com/spring".into(),
        page_id: Some("1234567890".into()),
        instagram_actor_id: None,
    }
}

fn new_parents() -> ParentInputs {
    ParentInputs {
        campaign: CampaignInput::New(NewCampaign {
            name: "Spring Launch".into(),
            objective: Objective::OutcomeSales,
            status: EntityStatus::Paused,
            budget_type: BudgetType::CampaignBudget,
            daily_budget: Some(50.0),
            bid_strategy: None,
        }),
        ad_set: AdSetInput::New(NewAdSet {
            name: "US 25-54".into(),
            optimization_goal: OptimizationGoal::LinkClicks,
            targeting: Targeting {
                include: GeoLocations {
                    countries: vec!["US".into()],
                    ..Default::default()
                },
                age_min: 25,
                age_max: 54,
                ..Default::default()
            },
            daily_budget: None,
            bid_strategy: None,
            bid_amount: None,
            start_time: None,
            pixel_id: None,
            conversion_event: None,
            attribution_setting: None,
            status: EntityStatus::Paused,
        }),
    }
}

fn remote(id: &str, name: &str, url: String) -> MediaAsset {
    MediaAsset::from_source(id, name, MediaSource::RemoteUrl { url: url.parse().unwrap() })
}

#[tokio::test]
async fn test_image_and_video_batch_against_graph_api() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/media/hero.png");
        then.status(200).body("png-bytes");
    });
    let campaigns = server.mock(|when, then| {
        when.method(POST).path("/v24.0/act_7/campaigns");
        then.status(200).json_body(json!({"id": "cmp_100"}));
    });
    let ad_sets = server.mock(|when, then| {
        when.method(POST).path("/v24.0/act_7/adsets");
        then.status(200).json_body(json!({"id": "adset_200"}));
    });
    let images = server.mock(|when, then| {
        when.method(POST).path("/v24.0/act_7/adimages");
        then.status(200).json_body(json!({"images": {"bytes": {"hash": "hash_1"}}}));
    });
    let videos = server.mock(|when, then| {
        when.method(POST).path("/v24.0/act_7/advideos");
        then.status(400).json_body(json!({
            "error": {"message": "Video upload failed", "error_user_msg": "Unsupported codec"}
        }));
    });
    let creatives = server.mock(|when, then| {
        when.method(POST).path("/v24.0/act_7/adcreatives");
        then.status(200).json_body(json!({"id": "cr_1"}));
    });
    let ads = server.mock(|when, then| {
        when.method(POST).path("/v24.0/act_7/ads");
        then.status(200).json_body(json!({"id": "ad_1"}));
    });

    let client = GraphApiClient::new(&PlatformConfig {
        base_url: server.base_url(),
        api_version: "v24.0".into(),
        access_token: "token".into(),
        ad_account_id: "7".into(),
        request_timeout_secs: 5,
    })
    .unwrap();

    let media = vec![
        remote("img", "hero", format!("{}/media/hero.png", server.base_url())),
        remote("vid", "promo", format!("{}/media/promo.mp4", server.base_url())),
    ];
    assert_eq!(media[1].kind, MediaKind::Video);
    let request = BulkSubmissionRequest {
        media,
        template: template(&["Buy now", "Limited time"], &["Great product"]),
        parents: new_parents(),
    };

    let specs = request.prepare().unwrap();
    let order: Vec<_> = specs
        .iter()
        .map(|s| (s.media_asset_id.as_str(), s.headline_index, s.body_index))
        .collect();
    assert_eq!(order, vec![("img", 0, 0), ("img", 1, 0), ("vid", 0, 0), ("vid", 1, 0)]);

    let run = BulkSubmission::new(Arc::new(client), Arc::new(DiscardRecords), settings());
    let report = run
        .run(&specs, &request.media, &request.parents, &request.template)
        .await
        .unwrap();

    let outcomes: Vec<_> = report.results.iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            SubmissionOutcome::Success,
            SubmissionOutcome::Success,
            SubmissionOutcome::Failure,
            SubmissionOutcome::Failure
        ]
    );
    assert_eq!(report.summary.success_count, 2);
    assert_eq!(report.summary.failure_count, 2);
    assert_eq!(report.summary.failures[0].display_name, "promo - H1B1");
    assert_eq!(
        report.summary.failures[0].message,
        "Failed to create promo - H1B1: Video upload failed: Unsupported codec"
    );
    assert_eq!(report.parents.campaign_remote_id, "cmp_100");
    assert_eq!(report.parents.ad_set_remote_id, "adset_200");
    assert_eq!(run.state(), RunState::Complete);

    campaigns.assert_hits(1);
    ad_sets.assert_hits(1);
    images.assert_hits(2);
    videos.assert_hits(2);
    creatives.assert_hits(2);
    ads.assert_hits(2);
}

#[tokio::test]
async fn test_parents_are_created_once_for_many_ads() {
    let platform = Arc::new(InMemoryPlatform::new());
    let media: Vec<_> = (1..=3)
        .map(|n| remote(&format!("m{n}"), "", format!("https://cdn.example.com/{n}.png")))
        .collect();
    let request = BulkSubmissionRequest {
        media,
        template: template(&["A", "B", "C"], &["X", "Y", ""]),
        parents: new_parents(),
    };

    let run = BulkSubmission::new(platform.clone(), Arc::new(DiscardRecords), settings());
    let report = run.run_request(&request).await.unwrap();

    assert_eq!(report.results.len(), 18);
    assert_eq!(platform.count(Operation::CreateCampaign), 1);
    assert_eq!(platform.count(Operation::CreateAdSet), 1);
    assert_eq!(platform.count(Operation::CreateAd), 18);
    assert_eq!(report.results[17].display_name, "Image 3 - H3B2");
}

#[tokio::test]
async fn test_existing_campaign_is_never_created() {
    let platform = Arc::new(InMemoryPlatform::new());
    let mut parents = new_parents();
    parents.campaign = CampaignInput::Existing {
        remote_id: "cmp_existing".into(),
        budget_type: BudgetType::CampaignBudget,
    };
    let request = BulkSubmissionRequest {
        media: vec![remote("m1", "hero", "https://cdn.example.com/hero.png".into())],
        template: template(&["A"], &["X"]),
        parents,
    };

    let run = BulkSubmission::new(platform.clone(), Arc::new(DiscardRecords), settings());
    let report = run.run_request(&request).await.unwrap();

    assert_eq!(platform.count(Operation::CreateCampaign), 0);
    assert_eq!(platform.count(Operation::CreateAdSet), 1);
    assert_eq!(report.parents.campaign_remote_id, "cmp_existing");
}

#[tokio::test]
async fn test_every_item_failing_still_yields_full_results() {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.fail_operation(Operation::CreateCreative, "Page is not published");
    let request = BulkSubmissionRequest {
        media: vec![
            remote("m1", "hero", "https://cdn.example.com/hero.png".into()),
            remote("m2", "side", "https://cdn.example.com/side.png".into()),
        ],
        template: template(&["A", "B"], &["X"]),
        parents: new_parents(),
    };

    let run = BulkSubmission::new(platform.clone(), Arc::new(DiscardRecords), settings());
    let progress = run.subscribe();
    let report = run.run_request(&request).await.unwrap();

    assert_eq!(report.results.len(), 4);
    assert_eq!(report.summary.success_count, 0);
    assert_eq!(report.summary.failure_count, 4);
    assert!(report
        .summary
        .failures
        .iter()
        .all(|f| f.message.ends_with("Page is not published")));
    assert_eq!(progress.borrow().completed_count, 4);
    assert_eq!(platform.count(Operation::CreateAd), 0);
}

#[tokio::test]
async fn test_budget_conflict_stops_before_any_remote_call() {
    let platform = Arc::new(InMemoryPlatform::new());
    let mut parents = new_parents();
    if let AdSetInput::New(ad_set) = &mut parents.ad_set {
        ad_set.daily_budget = Some(15.0);
    }
    let request = BulkSubmissionRequest {
        media: vec![remote("m1", "hero", "https://cdn.example.com/hero.png".into())],
        template: template(&["A"], &["X"]),
        parents,
    };

    assert!(request.prepare().is_err());
    let run = BulkSubmission::new(platform.clone(), Arc::new(DiscardRecords), settings());
    let err = run.run_request(&request).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(platform.calls().is_empty());
}

#[test]
fn test_preview_matches_submission_order() {
    let media = vec![
        remote("a", "first", "https://cdn.example.com/a.png".into()),
        remote("b", "second", "https://cdn.example.com/b.png".into()),
    ];
    let t = template(&["A", "", ""], &["X", "Y", ""]);
    let specs = PermutationExpander::new().expand_template(&media, &t).unwrap();
    let names: Vec<_> = specs.iter().map(|s| s.display_name.as_str()).collect();
    assert_eq!(names, vec!["first - H1B1", "first - H1B2", "second - H1B1", "second - H1B2"]);
}
