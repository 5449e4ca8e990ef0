//! Record sink that forwards local records to a running adlaunch service.

use std::time::Duration;

use adlaunch_core::records::{AdRecordSink, LocalAdRecord, LocalAdSetRecord, LocalCampaignRecord};
use adlaunch_core::{LaunchError, LaunchResult};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::models::{InsertedRecord, SavedRecord};

pub struct HttpRecordSink {
    http: reqwest::Client,
    /// `{base_url}/api/v1`
    api_root: String,
}

impl HttpRecordSink {
    /// `base_url` is the service root, e.g. `http://localhost:3001`.
    pub fn new(base_url: &str) -> LaunchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LaunchError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_root: format!("{}/api/v1", base_url.trim_end_matches('/')),
        })
    }

    async fn post<B: Serialize>(&self, collection: &str, id: &str, body: &B) -> LaunchResult<reqwest::Response> {
        let response = self
            .http
            .post(format!("{}/{collection}", self.api_root))
            .json(body)
            .send()
            .await
            .map_err(|e| LaunchError::LocalPersistence(format!("record service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LaunchError::LocalPersistence(format!(
                "record service returned {status} for {id}"
            )));
        }
        Ok(response)
    }

    async fn save_parent<B: Serialize>(&self, collection: &str, id: &str, body: &B) -> LaunchResult<()> {
        let saved: SavedRecord = self
            .post(collection, id, body)
            .await?
            .json()
            .await
            .map_err(|e| LaunchError::LocalPersistence(format!("unreadable record service reply: {e}")))?;
        debug!(collection, record_id = %saved.id, created = saved.created, "Parent record forwarded");
        Ok(())
    }
}

#[async_trait]
impl AdRecordSink for HttpRecordSink {
    async fn persist(&self, record: LocalAdRecord) -> LaunchResult<()> {
        let id = record.id.clone();
        let inserted: Vec<InsertedRecord> = self
            .post("ads", &id, &record)
            .await?
            .json()
            .await
            .map_err(|e| LaunchError::LocalPersistence(format!("unreadable record service reply: {e}")))?;
        match inserted.iter().find(|r| r.id == id) {
            Some(r) if r.success => {
                debug!(record_id = %id, "Ad record forwarded");
                Ok(())
            }
            _ => Err(LaunchError::LocalPersistence(format!("record service rejected {id}"))),
        }
    }

    async fn persist_campaign(&self, record: LocalCampaignRecord) -> LaunchResult<()> {
        self.save_parent("campaigns", &record.id, &record).await
    }

    async fn persist_ad_set(&self, record: LocalAdSetRecord) -> LaunchResult<()> {
        self.save_parent("ad-sets", &record.id, &record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adlaunch_core::campaign::{BudgetType, EntityStatus, Objective};
    use adlaunch_core::types::CallToAction;
    use chrono::Utc;
    use httpmock::prelude::*;
    use serde_json::json;

    fn record() -> LocalAdRecord {
        LocalAdRecord {
            id: "spec_1".into(),
            ad_set_id: "adset_1".into(),
            name: "hero - H1B1".into(),
            creative_name: "Spring".into(),
            media_url: "https://cdn.example.com/hero.png".into(),
            headlines: vec!["A".into()],
            bodies: vec!["X".into()],
            description: None,
            cta: CallToAction::LearnMore,
            website_url: "https://shop.example.com".into(),
            status: EntityStatus::Paused,
            remote_ad_id: "ad_1".into(),
            remote_creative_id: "cr_1".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_is_posted() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/ads")
                .header("content-type", "application/json");
            then.status(200).json_body(json!([{"id": "spec_1", "success": true}]));
        });

        let sink = HttpRecordSink::new(&format!("{}/", server.base_url())).unwrap();
        sink.persist(record()).await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_rejected_record_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/ads");
            then.status(200).json_body(json!([{"id": "spec_1", "success": false}]));
        });

        let sink = HttpRecordSink::new(&server.base_url()).unwrap();
        let err = sink.persist(record()).await.unwrap_err();
        assert!(matches!(err, LaunchError::LocalPersistence(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/ads");
            then.status(500);
        });

        let sink = HttpRecordSink::new(&server.base_url()).unwrap();
        assert!(sink.persist(record()).await.is_err());
    }

    #[tokio::test]
    async fn test_campaign_record_is_posted_and_duplicate_accepted() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/campaigns")
                .header("content-type", "application/json");
            then.status(200).json_body(json!({"id": "cmp_1", "created": false}));
        });

        let sink = HttpRecordSink::new(&server.base_url()).unwrap();
        let campaign = LocalCampaignRecord {
            id: "cmp_1".into(),
            name: "Spring".into(),
            objective: Objective::OutcomeTraffic,
            budget_type: BudgetType::AdSetBudget,
            daily_budget: None,
            bid_strategy: None,
            status: EntityStatus::Paused,
            created_at: Utc::now(),
        };
        sink.persist_campaign(campaign).await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_ad_set_record_rejection_is_an_error() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v1/ad-sets");
            then.status(400).json_body(json!({"error": "invalid_record", "message": "no campaign id"}));
        });

        let sink = HttpRecordSink::new(&server.base_url()).unwrap();
        let ad_set: LocalAdSetRecord = serde_json::from_value(json!({
            "id": "as_1",
            "campaign_id": "",
            "name": "US",
            "optimization_goal": "LINK_CLICKS",
            "status": "PAUSED",
            "created_at": "2026-03-01T00:00:00Z"
        }))
        .unwrap();
        let err = sink.persist_ad_set(ad_set).await.unwrap_err();
        assert!(matches!(err, LaunchError::LocalPersistence(_)));
        mock.assert();
    }
}
