//! Parent resource inputs (campaign and ad set) and the budget plan that
//! decides where spend limits live.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LaunchError, LaunchResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Objective {
    OutcomeSales,
    OutcomeTraffic,
    OutcomeLeads,
    OutcomeEngagement,
    OutcomeAwareness,
    OutcomeAppPromotion,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidStrategy {
    LowestCostWithoutCap,
    LowestCostWithBidCap,
    CostCap,
}

impl BidStrategy {
    /// Strategies that take an explicit bid amount.
    pub fn uses_bid_amount(&self) -> bool {
        matches!(self, BidStrategy::LowestCostWithBidCap | BidStrategy::CostCap)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationGoal {
    OffsiteConversions,
    LinkClicks,
    LandingPageViews,
    Impressions,
    Reach,
    PostEngagement,
    Thruplay,
    VideoViews,
    LeadGeneration,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityStatus {
    #[default]
    Paused,
    Active,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Paused => "PAUSED",
            EntityStatus::Active => "ACTIVE",
        }
    }
}

/// Where the daily spend limit is enforced for a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BudgetType {
    #[serde(alias = "CBO")]
    CampaignBudget,
    #[serde(alias = "ABO")]
    AdSetBudget,
}

// ─── Targeting ──────────────────────────────────────────────────────────

/// A platform location key (region, city or market).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeoKey {
    pub key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeoLocations {
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub regions: Vec<GeoKey>,
    #[serde(default)]
    pub cities: Vec<GeoKey>,
    #[serde(default)]
    pub geo_markets: Vec<GeoKey>,
}

impl GeoLocations {
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
            && self.regions.is_empty()
            && self.cities.is_empty()
            && self.geo_markets.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Targeting {
    #[serde(default)]
    pub include: GeoLocations,
    #[serde(default)]
    pub exclude: GeoLocations,
    #[serde(default = "default_age_min")]
    pub age_min: u8,
    #[serde(default = "default_age_max")]
    pub age_max: u8,
    /// Platform gender codes: 1 = male, 2 = female. Empty means all.
    #[serde(default)]
    pub genders: Vec<u8>,
    /// Manual placements. Empty means automatic placements.
    #[serde(default)]
    pub publisher_platforms: Vec<String>,
}

fn default_age_min() -> u8 {
    18
}
fn default_age_max() -> u8 {
    65
}

impl Default for Targeting {
    fn default() -> Self {
        Self {
            include: GeoLocations::default(),
            exclude: GeoLocations::default(),
            age_min: default_age_min(),
            age_max: default_age_max(),
            genders: Vec::new(),
            publisher_platforms: Vec::new(),
        }
    }
}

// ─── Attribution ────────────────────────────────────────────────────────

/// Conversion attribution window, written like `7d_click_1d_view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributionSetting {
    pub click_window_days: u32,
    pub view_through: bool,
}

impl AttributionSetting {
    pub fn parse(raw: &str) -> LaunchResult<Self> {
        let invalid = || LaunchError::Validation(format!("unrecognised attribution setting '{raw}'"));
        let window = raw.split('_').next().ok_or_else(invalid)?;
        let click_window_days = window
            .strip_suffix('d')
            .and_then(|days| days.parse::<u32>().ok())
            .filter(|days| *days > 0)
            .ok_or_else(invalid)?;
        Ok(Self {
            click_window_days,
            view_through: raw.contains("view"),
        })
    }
}

// ─── Campaign & Ad Set Inputs ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub objective: Objective,
    #[serde(default)]
    pub status: EntityStatus,
    pub budget_type: BudgetType,
    /// Daily budget in currency units. Only meaningful for campaign budgets.
    #[serde(default)]
    pub daily_budget: Option<f64>,
    #[serde(default)]
    pub bid_strategy: Option<BidStrategy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdSet {
    pub name: String,
    pub optimization_goal: OptimizationGoal,
    #[serde(default)]
    pub targeting: Targeting,
    /// Daily budget in currency units. Only meaningful for ad-set budgets.
    #[serde(default)]
    pub daily_budget: Option<f64>,
    #[serde(default)]
    pub bid_strategy: Option<BidStrategy>,
    #[serde(default)]
    pub bid_amount: Option<f64>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pixel_id: Option<String>,
    #[serde(default)]
    pub conversion_event: Option<String>,
    #[serde(default)]
    pub attribution_setting: Option<String>,
    #[serde(default)]
    pub status: EntityStatus,
}

impl NewAdSet {
    /// Pixel and event, present only when both are set for conversion goals.
    pub fn promoted_object(&self) -> Option<(&str, &str)> {
        if self.optimization_goal != OptimizationGoal::OffsiteConversions {
            return None;
        }
        let pixel = self.pixel_id.as_deref().filter(|p| !p.trim().is_empty())?;
        let event = self.conversion_event.as_deref().filter(|e| !e.trim().is_empty())?;
        Some((pixel, event))
    }

    pub fn validate(&self) -> LaunchResult<()> {
        if self.name.trim().is_empty() {
            return Err(LaunchError::Validation("ad set name must not be empty".into()));
        }
        let t = &self.targeting;
        if t.include.is_empty() {
            return Err(LaunchError::Validation(
                "ad set targeting needs at least one location".into(),
            ));
        }
        if !(13..=65).contains(&t.age_min) || !(13..=65).contains(&t.age_max) || t.age_min > t.age_max {
            return Err(LaunchError::Validation(format!(
                "invalid age range {}-{}",
                t.age_min, t.age_max
            )));
        }
        if let Some(setting) = self.attribution_setting.as_deref() {
            AttributionSetting::parse(setting)?;
        }
        Ok(())
    }
}

/// Campaign selection: reuse a remote campaign or create one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CampaignInput {
    Existing {
        remote_id: String,
        budget_type: BudgetType,
    },
    New(NewCampaign),
}

impl CampaignInput {
    pub fn budget_type(&self) -> BudgetType {
        match self {
            CampaignInput::Existing { budget_type, .. } => *budget_type,
            CampaignInput::New(campaign) => campaign.budget_type,
        }
    }
}

/// Ad set selection: reuse a remote ad set or create one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AdSetInput {
    Existing { remote_id: String },
    New(NewAdSet),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentInputs {
    pub campaign: CampaignInput,
    pub ad_set: AdSetInput,
}

// ─── Budget Plan ────────────────────────────────────────────────────────

/// Budget attached to a new campaign payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CampaignBudget {
    Daily { amount: f64 },
    AdSetManaged,
}

/// Budget attached to a new ad set payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdSetBudget {
    CampaignManaged,
    Daily { amount: f64 },
}

/// Convert a currency amount to the platform's minor units.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
