use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::{
    BidStrategy, BudgetType, EntityStatus, NewAdSet, NewCampaign, Objective, OptimizationGoal, Targeting,
};
use crate::error::LaunchResult;
use crate::types::CallToAction;

/// Local bookkeeping copy of an ad that now exists on the remote platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalAdRecord {
    pub id: String,
    pub ad_set_id: String,
    pub name: String,
    pub creative_name: String,
    pub media_url: String,
    pub headlines: Vec<String>,
    pub bodies: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub cta: CallToAction,
    pub website_url: String,
    pub status: EntityStatus,
    pub remote_ad_id: String,
    pub remote_creative_id: String,
    pub created_at: DateTime<Utc>,
}

/// Local copy of a campaign this service created. `id` is the remote id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalCampaignRecord {
    pub id: String,
    pub name: String,
    pub objective: Objective,
    pub budget_type: BudgetType,
    #[serde(default)]
    pub daily_budget: Option<f64>,
    #[serde(default)]
    pub bid_strategy: Option<BidStrategy>,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
}

impl LocalCampaignRecord {
    pub fn from_new(remote_id: &str, campaign: &NewCampaign) -> Self {
        Self {
            id: remote_id.to_string(),
            name: campaign.name.clone(),
            objective: campaign.objective,
            budget_type: campaign.budget_type,
            daily_budget: campaign.daily_budget,
            bid_strategy: campaign.bid_strategy,
            status: campaign.status,
            created_at: Utc::now(),
        }
    }
}

/// Local copy of an ad set this service created. `id` is the remote id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalAdSetRecord {
    pub id: String,
    pub campaign_id: String,
    pub name: String,
    pub optimization_goal: OptimizationGoal,
    #[serde(default)]
    pub targeting: Targeting,
    #[serde(default)]
    pub daily_budget: Option<f64>,
    #[serde(default)]
    pub bid_strategy: Option<BidStrategy>,
    #[serde(default)]
    pub bid_amount: Option<f64>,
    #[serde(default)]
    pub pixel_id: Option<String>,
    #[serde(default)]
    pub conversion_event: Option<String>,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
}

impl LocalAdSetRecord {
    pub fn from_new(remote_id: &str, campaign_id: &str, ad_set: &NewAdSet) -> Self {
        Self {
            id: remote_id.to_string(),
            campaign_id: campaign_id.to_string(),
            name: ad_set.name.clone(),
            optimization_goal: ad_set.optimization_goal,
            targeting: ad_set.targeting.clone(),
            daily_budget: ad_set.daily_budget,
            bid_strategy: ad_set.bid_strategy,
            bid_amount: ad_set.bid_amount,
            pixel_id: ad_set.pixel_id.clone(),
            conversion_event: ad_set.conversion_event.clone(),
            status: ad_set.status,
            created_at: Utc::now(),
        }
    }
}

/// Destination for local records written after successful remote creates.
///
/// Parent records default to a no-op so sinks that only track ads need not
/// implement them. Saving a parent whose id is already stored succeeds.
#[async_trait]
pub trait AdRecordSink: Send + Sync {
    async fn persist(&self, record: LocalAdRecord) -> LaunchResult<()>;

    async fn persist_campaign(&self, _record: LocalCampaignRecord) -> LaunchResult<()> {
        Ok(())
    }

    async fn persist_ad_set(&self, _record: LocalAdSetRecord) -> LaunchResult<()> {
        Ok(())
    }
}

/// Sink that drops every record; for runs without local bookkeeping.
pub struct DiscardRecords;

#[async_trait]
impl AdRecordSink for DiscardRecords {
    async fn persist(&self, _record: LocalAdRecord) -> LaunchResult<()> {
        Ok(())
    }
}
