//! Request bodies for the Graph marketing edges.
//!
//! Budget fields are chosen by matching the budget plan exhaustively, so a
//! payload can never carry both a campaign and an ad-set daily budget.

use adlaunch_core::campaign::{
    to_minor_units, AdSetBudget, AttributionSetting, BidStrategy, CampaignBudget, EntityStatus,
    GeoKey, GeoLocations, NewAdSet, NewCampaign, Objective, OptimizationGoal,
};
use adlaunch_core::types::{CallToAction, MediaKind};
use serde::Serialize;

use crate::client::{AdRequest, CreativeRequest};

// ─── Campaign ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CampaignPayload<'a> {
    pub name: &'a str,
    pub objective: Objective,
    pub status: EntityStatus,
    pub special_ad_categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_adset_budget_sharing_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_strategy: Option<BidStrategy>,
}

impl<'a> CampaignPayload<'a> {
    pub fn build(campaign: &'a NewCampaign, budget: &CampaignBudget) -> Self {
        let (daily_budget, sharing) = match budget {
            CampaignBudget::Daily { amount } => (Some(to_minor_units(*amount)), None),
            CampaignBudget::AdSetManaged => (None, Some(false)),
        };
        Self {
            name: &campaign.name,
            objective: campaign.objective,
            status: campaign.status,
            special_ad_categories: Vec::new(),
            daily_budget,
            is_adset_budget_sharing_enabled: sharing,
            bid_strategy: campaign.bid_strategy,
        }
    }
}

// ─── Ad Set ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GeoPayload<'a> {
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub countries: &'a [String],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub regions: &'a [GeoKey],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub cities: &'a [GeoKey],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub geo_markets: &'a [GeoKey],
}

impl<'a> From<&'a GeoLocations> for GeoPayload<'a> {
    fn from(geo: &'a GeoLocations) -> Self {
        Self {
            countries: &geo.countries,
            regions: &geo.regions,
            cities: &geo.cities,
            geo_markets: &geo.geo_markets,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TargetingAutomation {
    pub advantage_audience: u8,
}

#[derive(Debug, Serialize)]
pub struct TargetingPayload<'a> {
    pub geo_locations: GeoPayload<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_geo_locations: Option<GeoPayload<'a>>,
    pub age_min: u8,
    pub age_max: u8,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub genders: &'a [u8],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub publisher_platforms: &'a [String],
    pub targeting_automation: TargetingAutomation,
}

#[derive(Debug, Serialize)]
pub struct PromotedObject<'a> {
    pub pixel_id: &'a str,
    pub custom_event_type: &'a str,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AttributionSpec {
    pub event_type: &'static str,
    pub window_days: u32,
}

#[derive(Debug, Serialize)]
pub struct AdSetPayload<'a> {
    pub name: &'a str,
    pub campaign_id: &'a str,
    pub billing_event: &'static str,
    pub optimization_goal: OptimizationGoal,
    pub is_dynamic_creative: bool,
    pub status: EntityStatus,
    pub targeting: TargetingPayload<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_strategy: Option<BidStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted_object: Option<PromotedObject<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution_spec: Option<Vec<AttributionSpec>>,
}

impl<'a> AdSetPayload<'a> {
    pub fn build(ad_set: &'a NewAdSet, campaign_id: &'a str, budget: &AdSetBudget) -> Self {
        let t = &ad_set.targeting;
        let targeting = TargetingPayload {
            geo_locations: GeoPayload::from(&t.include),
            excluded_geo_locations: (!t.exclude.is_empty()).then(|| GeoPayload::from(&t.exclude)),
            age_min: t.age_min,
            age_max: t.age_max,
            genders: &t.genders,
            publisher_platforms: &t.publisher_platforms,
            targeting_automation: TargetingAutomation { advantage_audience: 0 },
        };

        let (daily_budget, bid_strategy) = match budget {
            AdSetBudget::CampaignManaged => (None, ad_set.bid_strategy),
            AdSetBudget::Daily { amount } => (
                Some(to_minor_units(*amount)),
                Some(ad_set.bid_strategy.unwrap_or(BidStrategy::LowestCostWithoutCap)),
            ),
        };
        let bid_amount = ad_set
            .bid_amount
            .filter(|_| bid_strategy.is_some_and(|s| s.uses_bid_amount()))
            .map(to_minor_units);

        let promoted_object = ad_set
            .promoted_object()
            .map(|(pixel_id, custom_event_type)| PromotedObject { pixel_id, custom_event_type });
        let attribution_spec = promoted_object
            .as_ref()
            .and(ad_set.attribution_setting.as_deref())
            .and_then(|raw| AttributionSetting::parse(raw).ok())
            .map(attribution_spec);

        Self {
            name: &ad_set.name,
            campaign_id,
            billing_event: "IMPRESSIONS",
            optimization_goal: ad_set.optimization_goal,
            is_dynamic_creative: false,
            status: ad_set.status,
            targeting,
            daily_budget,
            bid_strategy,
            bid_amount,
            start_time: ad_set.start_time.map(|ts| ts.timestamp()),
            promoted_object,
            attribution_spec,
        }
    }
}

fn attribution_spec(setting: AttributionSetting) -> Vec<AttributionSpec> {
    let mut spec = vec![AttributionSpec {
        event_type: "CLICK_THROUGH",
        window_days: setting.click_window_days,
    }];
    if setting.view_through {
        spec.push(AttributionSpec {
            event_type: "VIEW_THROUGH",
            window_days: 1,
        });
    }
    spec
}

// ─── Creative ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CtaValue<'a> {
    pub link: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CtaPayload<'a> {
    #[serde(rename = "type")]
    pub kind: CallToAction,
    pub value: CtaValue<'a>,
}

#[derive(Debug, Serialize)]
pub struct LinkData<'a> {
    pub image_hash: &'a str,
    pub link: &'a str,
    pub message: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub call_to_action: CtaPayload<'a>,
}

#[derive(Debug, Serialize)]
pub struct VideoData<'a> {
    pub video_id: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<&'a str>,
    pub call_to_action: CtaPayload<'a>,
}

#[derive(Debug, Serialize)]
pub struct ObjectStorySpec<'a> {
    pub page_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_actor_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_data: Option<LinkData<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_data: Option<VideoData<'a>>,
}

#[derive(Debug, Serialize)]
pub struct CreativePayload<'a> {
    pub name: &'a str,
    pub object_story_spec: ObjectStorySpec<'a>,
}

impl<'a> CreativePayload<'a> {
    pub fn build(request: &'a CreativeRequest) -> Self {
        let call_to_action = || CtaPayload {
            kind: request.call_to_action,
            value: CtaValue { link: &request.link },
        };
        let (link_data, video_data) = match request.media.kind {
            MediaKind::Image => (
                Some(LinkData {
                    image_hash: &request.media.remote_id,
                    link: &request.link,
                    message: &request.body,
                    name: &request.headline,
                    description: request.description.as_deref().unwrap_or_default(),
                    call_to_action: call_to_action(),
                }),
                None,
            ),
            MediaKind::Video => (
                None,
                Some(VideoData {
                    video_id: &request.media.remote_id,
                    title: &request.headline,
                    message: &request.body,
                    link_description: request.description.as_deref(),
                    image_url: request.media.thumbnail_url.as_deref(),
                    call_to_action: call_to_action(),
                }),
            ),
        };
        Self {
            name: &request.name,
            object_story_spec: ObjectStorySpec {
                page_id: &request.page_id,
                instagram_actor_id: request.instagram_actor_id.as_deref(),
                link_data,
                video_data,
            },
        }
    }
}

// ─── Ad ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreativeRef<'a> {
    pub creative_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct AdPayload<'a> {
    pub name: &'a str,
    pub adset_id: &'a str,
    pub creative: CreativeRef<'a>,
    pub status: EntityStatus,
}

impl<'a> AdPayload<'a> {
    pub fn build(request: &'a AdRequest) -> Self {
        Self {
            name: &request.name,
            adset_id: &request.ad_set_id,
            creative: CreativeRef {
                creative_id: &request.creative_id,
            },
            status: request.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MediaHandle, ReadyStatus};
    use adlaunch_core::campaign::{BudgetType, Targeting};
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};

    fn campaign() -> NewCampaign {
        NewCampaign {
            name: "Spring".into(),
            objective: Objective::OutcomeSales,
            status: EntityStatus::Paused,
            budget_type: BudgetType::CampaignBudget,
            daily_budget: Some(50.0),
            bid_strategy: None,
        }
    }

    fn ad_set() -> NewAdSet {
        NewAdSet {
            name: "US".into(),
            optimization_goal: OptimizationGoal::OffsiteConversions,
            targeting: Targeting {
                include: GeoLocations {
                    countries: vec!["US".into()],
                    ..Default::default()
                },
                ..Default::default()
            },
            daily_budget: Some(20.0),
            bid_strategy: Some(BidStrategy::CostCap),
            bid_amount: Some(1.5),
            start_time: Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()),
            pixel_id: Some("px".into()),
            conversion_event: Some("PURCHASE".into()),
            attribution_setting: Some("7d_click_1d_view".into()),
            status: EntityStatus::Paused,
        }
    }

    #[test]
    fn test_campaign_budget_variants() {
        let c = campaign();
        let daily = serde_json::to_value(CampaignPayload::build(&c, &CampaignBudget::Daily { amount: 50.0 })).unwrap();
        assert_eq!(daily["daily_budget"], json!(5000));
        assert_eq!(daily["special_ad_categories"], json!([]));
        assert!(daily.get("is_adset_budget_sharing_enabled").is_none());

        let managed = serde_json::to_value(CampaignPayload::build(&c, &CampaignBudget::AdSetManaged)).unwrap();
        assert!(managed.get("daily_budget").is_none());
        assert_eq!(managed["is_adset_budget_sharing_enabled"], json!(false));
        assert_eq!(managed["objective"], json!("OUTCOME_SALES"));
        assert_eq!(managed["status"], json!("PAUSED"));
    }

    #[test]
    fn test_ad_set_under_campaign_budget_omits_budget() {
        let a = ad_set();
        let body: Value =
            serde_json::to_value(AdSetPayload::build(&a, "c1", &AdSetBudget::CampaignManaged)).unwrap();
        assert!(body.get("daily_budget").is_none());
        assert_eq!(body["billing_event"], json!("IMPRESSIONS"));
        assert_eq!(body["is_dynamic_creative"], json!(false));
        assert_eq!(body["targeting"]["geo_locations"], json!({"countries": ["US"]}));
        assert!(body["targeting"].get("excluded_geo_locations").is_none());
        assert_eq!(body["targeting"]["targeting_automation"], json!({"advantage_audience": 0}));
        assert_eq!(body["promoted_object"], json!({"pixel_id": "px", "custom_event_type": "PURCHASE"}));
        assert_eq!(
            body["attribution_spec"],
            json!([
                {"event_type": "CLICK_THROUGH", "window_days": 7},
                {"event_type": "VIEW_THROUGH", "window_days": 1}
            ])
        );
        assert_eq!(body["bid_amount"], json!(150));
        assert_eq!(body["start_time"], json!(1772323200));
    }

    #[test]
    fn test_ad_set_budget_defaults_bid_strategy() {
        let mut a = ad_set();
        a.bid_strategy = None;
        let body: Value =
            serde_json::to_value(AdSetPayload::build(&a, "c1", &AdSetBudget::Daily { amount: 20.0 })).unwrap();
        assert_eq!(body["daily_budget"], json!(2000));
        assert_eq!(body["bid_strategy"], json!("LOWEST_COST_WITHOUT_CAP"));
        assert!(body.get("bid_amount").is_none());
    }

    #[test]
    fn test_conversion_fields_need_conversion_goal() {
        let mut a = ad_set();
        a.optimization_goal = OptimizationGoal::LinkClicks;
        a.targeting.exclude.countries = vec!["CA".into()];
        let body: Value =
            serde_json::to_value(AdSetPayload::build(&a, "c1", &AdSetBudget::CampaignManaged)).unwrap();
        assert!(body.get("promoted_object").is_none());
        assert!(body.get("attribution_spec").is_none());
        assert_eq!(body["targeting"]["excluded_geo_locations"], json!({"countries": ["CA"]}));
    }

    fn creative(kind: MediaKind) -> CreativeRequest {
        CreativeRequest {
            name: "Spring".into(),
            page_id: "page_1".into(),
            instagram_actor_id: None,
            media: MediaHandle {
                asset_id: "m1".into(),
                kind,
                remote_id: "abc".into(),
                ready: ReadyStatus::Ready,
                thumbnail_url: Some("https://cdn.example.com/t.jpg".into()),
            },
            headline: "Buy now".into(),
            body: "Great product".into(),
            description: None,
            call_to_action: CallToAction::ShopNow,
            link: "https://shop.example.com".into(),
        }
    }

    #[test]
    fn test_image_creative_uses_link_data() {
        let req = creative(MediaKind::Image);
        let body = serde_json::to_value(CreativePayload::build(&req)).unwrap();
        let spec = &body["object_story_spec"];
        assert_eq!(spec["page_id"], json!("page_1"));
        assert!(spec.get("instagram_actor_id").is_none());
        assert!(spec.get("video_data").is_none());
        assert_eq!(
            spec["link_data"],
            json!({
                "image_hash": "abc",
                "link": "https://shop.example.com",
                "message": "Great product",
                "name": "Buy now",
                "description": "",
                "call_to_action": {"type": "SHOP_NOW", "value": {"link": "https://shop.example.com"}}
            })
        );
    }

    #[test]
    fn test_video_creative_uses_video_data() {
        let req = creative(MediaKind::Video);
        let body = serde_json::to_value(CreativePayload::build(&req)).unwrap();
        let video = &body["object_story_spec"]["video_data"];
        assert_eq!(video["video_id"], json!("abc"));
        assert_eq!(video["title"], json!("Buy now"));
        assert_eq!(video["image_url"], json!("https://cdn.example.com/t.jpg"));
        assert!(body["object_story_spec"].get("link_data").is_none());
    }

    #[test]
    fn test_ad_payload_shape() {
        let req = AdRequest {
            name: "hero - H1B1".into(),
            ad_set_id: "as_1".into(),
            creative_id: "cr_1".into(),
            status: EntityStatus::Paused,
        };
        let body = serde_json::to_value(AdPayload::build(&req)).unwrap();
        assert_eq!(
            body,
            json!({"name": "hero - H1B1", "adset_id": "as_1", "creative": {"creative_id": "cr_1"}, "status": "PAUSED"})
        );
    }
}
