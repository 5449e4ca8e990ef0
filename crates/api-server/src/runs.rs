//! Registry of bulk-submission runs started through the service.
//!
//! Each run executes on its own task; the registry keeps watch receivers so
//! pollers can read the latest progress snapshot at any time. Finished runs
//! beyond the retention cap are dropped oldest first; active runs are kept.

use std::sync::Arc;

use adlaunch_core::records::AdRecordSink;
use adlaunch_core::types::{AdSpecification, BatchProgress};
use adlaunch_graph::AdPlatformClient;
use adlaunch_pipeline::{BulkReport, BulkSubmission, BulkSubmissionRequest, EngineSettings, RunState};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Clone)]
struct RunHandle {
    total: usize,
    created_at: DateTime<Utc>,
    state: watch::Receiver<RunState>,
    progress: watch::Receiver<BatchProgress>,
    outcome: Arc<Mutex<RunOutcome>>,
}

#[derive(Debug, Clone, Default)]
struct RunOutcome {
    finished: bool,
    report: Option<BulkReport>,
    error: Option<String>,
}

/// Point-in-time view of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub run_id: Uuid,
    pub state: RunState,
    pub total: usize,
    pub finished: bool,
    pub progress: BatchProgress,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BulkReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Finished runs kept for polling by default.
pub const DEFAULT_FINISHED_RUN_RETENTION: usize = 100;

pub struct RunRegistry {
    runs: DashMap<Uuid, RunHandle>,
    finished_retention: usize,
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_FINISHED_RUN_RETENTION)
    }

    pub fn with_retention(finished_retention: usize) -> Self {
        Self {
            runs: DashMap::new(),
            finished_retention,
        }
    }

    /// Spawn a run for already-validated specs and return its id.
    pub fn start(
        &self,
        client: Arc<dyn AdPlatformClient>,
        records: Arc<dyn AdRecordSink>,
        settings: EngineSettings,
        request: BulkSubmissionRequest,
        specs: Vec<AdSpecification>,
    ) -> Uuid {
        self.prune_finished();
        let run_id = Uuid::new_v4();
        let submission = BulkSubmission::new(client, records, settings);
        let handle = RunHandle {
            total: specs.len(),
            created_at: Utc::now(),
            state: submission.subscribe_state(),
            progress: submission.subscribe(),
            outcome: Arc::new(Mutex::new(RunOutcome::default())),
        };
        let outcome = handle.outcome.clone();
        self.runs.insert(run_id, handle);
        metrics::counter!("api.runs.started").increment(1);
        info!(%run_id, total = specs.len(), "Bulk submission run started");

        tokio::spawn(async move {
            let result = submission
                .run(&specs, &request.media, &request.parents, &request.template)
                .await;
            let mut outcome = outcome.lock();
            outcome.finished = true;
            match result {
                Ok(report) => {
                    info!(
                        %run_id,
                        success = report.summary.success_count,
                        failed = report.summary.failure_count,
                        "Bulk submission run finished"
                    );
                    outcome.report = Some(report);
                }
                Err(e) => {
                    error!(%run_id, error = %e, "Bulk submission run aborted");
                    metrics::counter!("api.runs.aborted").increment(1);
                    outcome.error = Some(e.to_string());
                }
            }
        });
        run_id
    }

    pub fn snapshot(&self, run_id: Uuid) -> Option<RunSnapshot> {
        self.runs.get(&run_id).map(|r| to_snapshot(*r.key(), r.value()))
    }

    /// Every known run, newest first.
    pub fn list(&self) -> Vec<RunSnapshot> {
        let mut runs: Vec<RunSnapshot> = self.runs.iter().map(|r| to_snapshot(*r.key(), r.value())).collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        runs
    }

    pub fn active_count(&self) -> usize {
        self.runs.iter().filter(|r| !r.value().outcome.lock().finished).count()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Drop the oldest finished runs beyond the retention cap.
    pub fn prune_finished(&self) -> usize {
        let mut finished: Vec<(Uuid, DateTime<Utc>)> = self
            .runs
            .iter()
            .filter(|r| r.value().outcome.lock().finished)
            .map(|r| (*r.key(), r.value().created_at))
            .collect();
        if finished.len() <= self.finished_retention {
            return 0;
        }
        finished.sort_by(|a, b| b.1.cmp(&a.1));
        let stale = finished.split_off(self.finished_retention);
        for (run_id, _) in &stale {
            self.runs.remove(run_id);
        }
        metrics::counter!("api.runs.pruned").increment(stale.len() as u64);
        debug!(pruned = stale.len(), retained = self.runs.len(), "Pruned finished runs");
        stale.len()
    }
}

fn to_snapshot(run_id: Uuid, handle: &RunHandle) -> RunSnapshot {
    let outcome = handle.outcome.lock().clone();
    RunSnapshot {
        run_id,
        state: *handle.state.borrow(),
        total: handle.total,
        finished: outcome.finished,
        progress: handle.progress.borrow().clone(),
        created_at: handle.created_at,
        report: outcome.report,
        error: outcome.error,
    }
}
