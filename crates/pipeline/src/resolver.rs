//! Parent resource resolution: one campaign and one ad set per run.

use std::sync::Arc;

use adlaunch_core::campaign::{
    AdSetBudget, AdSetInput, BudgetType, CampaignBudget, CampaignInput, NewAdSet, NewCampaign,
    ParentInputs,
};
use adlaunch_core::records::{AdRecordSink, LocalAdSetRecord, LocalCampaignRecord};
use adlaunch_core::types::ParentResourceRefs;
use adlaunch_core::{LaunchError, LaunchResult, ParentResource};
use adlaunch_graph::AdPlatformClient;
use tracing::{info, warn};

/// What the resolver will do for the campaign.
#[derive(Debug, Clone, Copy)]
pub enum CampaignStep<'a> {
    Reuse(&'a str),
    Create(&'a NewCampaign, CampaignBudget),
}

/// What the resolver will do for the ad set.
#[derive(Debug, Clone, Copy)]
pub enum AdSetStep<'a> {
    Reuse(&'a str),
    Create(&'a NewAdSet, AdSetBudget),
}

#[derive(Debug, Clone, Copy)]
pub struct ParentPlan<'a> {
    pub budget_type: BudgetType,
    pub campaign: CampaignStep<'a>,
    pub ad_set: AdSetStep<'a>,
}

/// Check parent inputs and decide where the budget lives. Makes no remote calls.
pub fn plan_parents(inputs: &ParentInputs) -> LaunchResult<ParentPlan<'_>> {
    let budget_type = inputs.campaign.budget_type();

    let campaign = match &inputs.campaign {
        CampaignInput::Existing { remote_id, .. } => CampaignStep::Reuse(non_empty_id(remote_id, "campaign")?),
        CampaignInput::New(campaign) => {
            if campaign.name.trim().is_empty() {
                return Err(LaunchError::Validation("campaign name must not be empty".into()));
            }
            CampaignStep::Create(campaign, campaign_budget(campaign)?)
        }
    };

    let ad_set = match &inputs.ad_set {
        AdSetInput::Existing { remote_id } => AdSetStep::Reuse(non_empty_id(remote_id, "ad set")?),
        AdSetInput::New(ad_set) => {
            ad_set.validate()?;
            AdSetStep::Create(ad_set, ad_set_budget(budget_type, ad_set)?)
        }
    };

    Ok(ParentPlan {
        budget_type,
        campaign,
        ad_set,
    })
}

fn non_empty_id<'a>(id: &'a str, what: &str) -> LaunchResult<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(LaunchError::Validation(format!("existing {what} id must not be empty")));
    }
    Ok(id)
}

fn campaign_budget(campaign: &NewCampaign) -> LaunchResult<CampaignBudget> {
    let amount = campaign.daily_budget.filter(|b| *b != 0.0);
    match (campaign.budget_type, amount) {
        (BudgetType::CampaignBudget, Some(amount)) if amount > 0.0 => Ok(CampaignBudget::Daily { amount }),
        (BudgetType::CampaignBudget, _) => Err(LaunchError::Validation(
            "a campaign budget needs a positive daily budget".into(),
        )),
        (BudgetType::AdSetBudget, Some(_)) => Err(LaunchError::BudgetConflict(
            "campaign carries a daily budget while budgets are set per ad set".into(),
        )),
        (BudgetType::AdSetBudget, None) => Ok(CampaignBudget::AdSetManaged),
    }
}

fn ad_set_budget(budget_type: BudgetType, ad_set: &NewAdSet) -> LaunchResult<AdSetBudget> {
    let amount = ad_set.daily_budget.filter(|b| *b != 0.0);
    match (budget_type, amount) {
        (BudgetType::CampaignBudget, Some(_)) => Err(LaunchError::BudgetConflict(
            "ad set carries a daily budget while the campaign manages the budget".into(),
        )),
        (BudgetType::CampaignBudget, None) => Ok(AdSetBudget::CampaignManaged),
        (BudgetType::AdSetBudget, Some(amount)) if amount > 0.0 => Ok(AdSetBudget::Daily { amount }),
        (BudgetType::AdSetBudget, _) => Err(LaunchError::Validation(
            "an ad set budget needs a positive daily budget".into(),
        )),
    }
}

/// Ensures exactly one campaign and one ad set exist before ads are submitted.
/// Newly created parents are copied to the record sink; a failed copy is
/// logged and never fails the run.
pub struct ParentResolver {
    client: Arc<dyn AdPlatformClient>,
    records: Arc<dyn AdRecordSink>,
}

impl ParentResolver {
    pub fn new(client: Arc<dyn AdPlatformClient>, records: Arc<dyn AdRecordSink>) -> Self {
        Self { client, records }
    }

    /// Reuse or create the parents. At most one create call per parent.
    pub async fn resolve(&self, inputs: &ParentInputs) -> LaunchResult<ParentResourceRefs> {
        let plan = plan_parents(inputs)?;

        let campaign_remote_id = match plan.campaign {
            CampaignStep::Reuse(id) => {
                info!(campaign_id = id, "Reusing existing campaign");
                id.to_string()
            }
            CampaignStep::Create(campaign, budget) => {
                let id = self
                    .client
                    .create_campaign(campaign, &budget)
                    .await
                    .map_err(|source| LaunchError::ParentResolution {
                        resource: ParentResource::Campaign,
                        source,
                    })?;
                metrics::counter!("bulk.parents.created").increment(1);
                self.persist_campaign(LocalCampaignRecord::from_new(&id, campaign)).await;
                id
            }
        };

        let ad_set_remote_id = match plan.ad_set {
            AdSetStep::Reuse(id) => {
                info!(ad_set_id = id, "Reusing existing ad set");
                id.to_string()
            }
            AdSetStep::Create(ad_set, budget) => {
                let id = self
                    .client
                    .create_ad_set(ad_set, &campaign_remote_id, &budget)
                    .await
                    .map_err(|source| LaunchError::ParentResolution {
                        resource: ParentResource::AdSet,
                        source,
                    })?;
                metrics::counter!("bulk.parents.created").increment(1);
                self.persist_ad_set(LocalAdSetRecord::from_new(&id, &campaign_remote_id, ad_set))
                    .await;
                id
            }
        };

        Ok(ParentResourceRefs {
            campaign_remote_id,
            ad_set_remote_id,
            budget_type: plan.budget_type,
        })
    }

    async fn persist_campaign(&self, record: LocalCampaignRecord) {
        let id = record.id.clone();
        if let Err(e) = self.records.persist_campaign(record).await {
            metrics::counter!("bulk.records.persist_failed").increment(1);
            warn!(campaign_id = %id, error = %e, "Failed to persist local campaign record");
        }
    }

    async fn persist_ad_set(&self, record: LocalAdSetRecord) {
        let id = record.id.clone();
        if let Err(e) = self.records.persist_ad_set(record).await {
            metrics::counter!("bulk.records.persist_failed").increment(1);
            warn!(ad_set_id = %id, error = %e, "Failed to persist local ad set record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adlaunch_core::campaign::{
        EntityStatus, GeoLocations, Objective, OptimizationGoal, Targeting,
    };
    use adlaunch_core::records::{DiscardRecords, LocalAdRecord};
    use adlaunch_graph::{InMemoryPlatform, Operation};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct ParentSink {
        campaigns: Mutex<Vec<LocalCampaignRecord>>,
        ad_sets: Mutex<Vec<LocalAdSetRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl AdRecordSink for ParentSink {
        async fn persist(&self, _record: LocalAdRecord) -> LaunchResult<()> {
            Ok(())
        }

        async fn persist_campaign(&self, record: LocalCampaignRecord) -> LaunchResult<()> {
            if self.fail {
                return Err(LaunchError::LocalPersistence("database is read-only".into()));
            }
            self.campaigns.lock().push(record);
            Ok(())
        }

        async fn persist_ad_set(&self, record: LocalAdSetRecord) -> LaunchResult<()> {
            if self.fail {
                return Err(LaunchError::LocalPersistence("database is read-only".into()));
            }
            self.ad_sets.lock().push(record);
            Ok(())
        }
    }

    fn new_campaign(budget_type: BudgetType, daily_budget: Option<f64>) -> CampaignInput {
        CampaignInput::New(NewCampaign {
            name: "Spring".into(),
            objective: Objective::OutcomeSales,
            status: EntityStatus::Paused,
            budget_type,
            daily_budget,
            bid_strategy: None,
        })
    }

    fn new_ad_set(daily_budget: Option<f64>) -> AdSetInput {
        AdSetInput::New(NewAdSet {
            name: "US".into(),
            optimization_goal: OptimizationGoal::LinkClicks,
            targeting: Targeting {
                include: GeoLocations {
                    countries: vec!["US".into()],
                    ..Default::default()
                },
                ..Default::default()
            },
            daily_budget,
            bid_strategy: None,
            bid_amount: None,
            start_time: None,
            pixel_id: None,
            conversion_event: None,
            attribution_setting: None,
            status: EntityStatus::Paused,
        })
    }

    #[tokio::test]
    async fn test_existing_parents_are_reused() {
        let platform = Arc::new(InMemoryPlatform::new());
        let resolver = ParentResolver::new(platform.clone(), Arc::new(DiscardRecords));
        let refs = resolver
            .resolve(&ParentInputs {
                campaign: CampaignInput::Existing {
                    remote_id: "cmp_9".into(),
                    budget_type: BudgetType::CampaignBudget,
                },
                ad_set: AdSetInput::Existing {
                    remote_id: "adset_9".into(),
                },
            })
            .await
            .unwrap();
        assert_eq!(refs.campaign_remote_id, "cmp_9");
        assert_eq!(refs.ad_set_remote_id, "adset_9");
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_new_parents_are_created_once() {
        let platform = Arc::new(InMemoryPlatform::new());
        let resolver = ParentResolver::new(platform.clone(), Arc::new(DiscardRecords));
        let refs = resolver
            .resolve(&ParentInputs {
                campaign: new_campaign(BudgetType::AdSetBudget, None),
                ad_set: new_ad_set(Some(25.0)),
            })
            .await
            .unwrap();
        assert_eq!(platform.count(Operation::CreateCampaign), 1);
        assert_eq!(platform.count(Operation::CreateAdSet), 1);
        assert_eq!(refs.budget_type, BudgetType::AdSetBudget);
        assert_ne!(refs.campaign_remote_id, refs.ad_set_remote_id);
    }

    #[test]
    fn test_campaign_budget_with_ad_set_budget_conflicts() {
        let inputs = ParentInputs {
            campaign: new_campaign(BudgetType::CampaignBudget, Some(50.0)),
            ad_set: new_ad_set(Some(10.0)),
        };
        assert!(matches!(plan_parents(&inputs), Err(LaunchError::BudgetConflict(_))));

        let inputs = ParentInputs {
            campaign: CampaignInput::Existing {
                remote_id: "cmp_1".into(),
                budget_type: BudgetType::CampaignBudget,
            },
            ad_set: new_ad_set(Some(10.0)),
        };
        assert!(matches!(plan_parents(&inputs), Err(LaunchError::BudgetConflict(_))));
    }

    #[test]
    fn test_ad_set_budget_requires_amount() {
        for missing in [None, Some(0.0)] {
            let inputs = ParentInputs {
                campaign: new_campaign(BudgetType::AdSetBudget, None),
                ad_set: new_ad_set(missing),
            };
            assert!(matches!(plan_parents(&inputs), Err(LaunchError::Validation(_))));
        }
    }

    #[test]
    fn test_campaign_budget_requires_amount() {
        let inputs = ParentInputs {
            campaign: new_campaign(BudgetType::CampaignBudget, None),
            ad_set: new_ad_set(None),
        };
        assert!(matches!(plan_parents(&inputs), Err(LaunchError::Validation(_))));
    }

    #[test]
    fn test_budget_plan_variants() {
        let inputs = ParentInputs {
            campaign: new_campaign(BudgetType::CampaignBudget, Some(40.0)),
            ad_set: new_ad_set(None),
        };
        let plan = plan_parents(&inputs).unwrap();
        assert!(matches!(plan.campaign, CampaignStep::Create(_, CampaignBudget::Daily { amount }) if amount == 40.0));
        assert!(matches!(plan.ad_set, AdSetStep::Create(_, AdSetBudget::CampaignManaged)));
    }

    #[tokio::test]
    async fn test_budget_conflict_makes_no_remote_calls() {
        let platform = Arc::new(InMemoryPlatform::new());
        let resolver = ParentResolver::new(platform.clone(), Arc::new(DiscardRecords));
        let err = resolver
            .resolve(&ParentInputs {
                campaign: new_campaign(BudgetType::CampaignBudget, Some(50.0)),
                ad_set: new_ad_set(Some(5.0)),
            })
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_is_parent_resolution_error() {
        let platform = Arc::new(InMemoryPlatform::new());
        platform.fail_operation(Operation::CreateAdSet, "Invalid targeting");
        let resolver = ParentResolver::new(platform.clone(), Arc::new(DiscardRecords));
        let err = resolver
            .resolve(&ParentInputs {
                campaign: new_campaign(BudgetType::CampaignBudget, Some(50.0)),
                ad_set: new_ad_set(None),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LaunchError::ParentResolution {
                resource: ParentResource::AdSet,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Failed to resolve ad set: Invalid targeting");
    }

    #[tokio::test]
    async fn test_created_parents_are_recorded_locally() {
        let platform = Arc::new(InMemoryPlatform::new());
        let sink = Arc::new(ParentSink::default());
        let resolver = ParentResolver::new(platform.clone(), sink.clone());
        let refs = resolver
            .resolve(&ParentInputs {
                campaign: new_campaign(BudgetType::AdSetBudget, None),
                ad_set: new_ad_set(Some(25.0)),
            })
            .await
            .unwrap();

        let campaigns = sink.campaigns.lock().clone();
        let ad_sets = sink.ad_sets.lock().clone();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].id, refs.campaign_remote_id);
        assert_eq!(campaigns[0].budget_type, BudgetType::AdSetBudget);
        assert_eq!(ad_sets.len(), 1);
        assert_eq!(ad_sets[0].id, refs.ad_set_remote_id);
        assert_eq!(ad_sets[0].campaign_id, refs.campaign_remote_id);
        assert_eq!(ad_sets[0].daily_budget, Some(25.0));
    }

    #[tokio::test]
    async fn test_reused_parents_are_not_recorded() {
        let platform = Arc::new(InMemoryPlatform::new());
        let sink = Arc::new(ParentSink::default());
        let resolver = ParentResolver::new(platform, sink.clone());
        resolver
            .resolve(&ParentInputs {
                campaign: CampaignInput::Existing {
                    remote_id: "cmp_9".into(),
                    budget_type: BudgetType::CampaignBudget,
                },
                ad_set: new_ad_set(None),
            })
            .await
            .unwrap();
        assert!(sink.campaigns.lock().is_empty());
        assert_eq!(sink.ad_sets.lock()[0].campaign_id, "cmp_9");
    }

    #[tokio::test]
    async fn test_failed_parent_record_does_not_fail_resolution() {
        let platform = Arc::new(InMemoryPlatform::new());
        let sink = Arc::new(ParentSink {
            fail: true,
            ..Default::default()
        });
        let resolver = ParentResolver::new(platform.clone(), sink);
        let refs = resolver
            .resolve(&ParentInputs {
                campaign: new_campaign(BudgetType::CampaignBudget, Some(50.0)),
                ad_set: new_ad_set(None),
            })
            .await
            .unwrap();
        assert!(!refs.ad_set_remote_id.is_empty());
        assert_eq!(platform.count(Operation::CreateAdSet), 1);
    }
}
