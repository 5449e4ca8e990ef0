//! Run orchestration: validate, resolve parents once, submit every spec,
//! then summarize.
//!
//! A `BulkSubmission` moves through
//! `Idle → ResolvingParents → (ParentsFailed | SubmittingItems → Complete)`
//! exactly once. Failed runs are not resumed; callers start a fresh one.

use std::sync::Arc;

use adlaunch_core::campaign::ParentInputs;
use adlaunch_core::records::AdRecordSink;
use adlaunch_core::types::{
    AdSpecification, BatchProgress, CreativeTemplate, MediaAsset, ParentResourceRefs, SubmissionResult,
};
use adlaunch_core::{LaunchError, LaunchResult};
use adlaunch_graph::AdPlatformClient;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{error, info};

use crate::engine::{EngineSettings, SubmissionEngine};
use crate::expander::PermutationExpander;
use crate::progress::{summarize, BatchSummary, ProgressTracker};
use crate::resolver::{plan_parents, ParentResolver};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    ResolvingParents,
    ParentsFailed,
    SubmittingItems,
    Complete,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::ParentsFailed | RunState::Complete)
    }
}

/// Everything a caller supplies for one bulk submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSubmissionRequest {
    pub media: Vec<MediaAsset>,
    pub template: CreativeTemplate,
    pub parents: ParentInputs,
}

impl BulkSubmissionRequest {
    /// Run every offline check and expand the permutations. No remote calls.
    pub fn prepare(&self) -> LaunchResult<Vec<AdSpecification>> {
        plan_parents(&self.parents)?;
        PermutationExpander::new().expand_template(&self.media, &self.template)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReport {
    pub parents: ParentResourceRefs,
    pub results: Vec<SubmissionResult>,
    pub summary: BatchSummary,
}

pub struct BulkSubmission {
    resolver: ParentResolver,
    engine: SubmissionEngine,
    state: watch::Sender<RunState>,
    progress_rx: watch::Receiver<BatchProgress>,
    progress_tx: Mutex<Option<watch::Sender<BatchProgress>>>,
}

impl BulkSubmission {
    pub fn new(
        client: Arc<dyn AdPlatformClient>,
        records: Arc<dyn AdRecordSink>,
        settings: EngineSettings,
    ) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        let (progress_tx, progress_rx) = watch::channel(BatchProgress::default());
        Self {
            resolver: ParentResolver::new(client.clone(), records.clone()),
            engine: SubmissionEngine::new(client, records, settings),
            state,
            progress_rx,
            progress_tx: Mutex::new(Some(progress_tx)),
        }
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Progress snapshots, updated before and after every item.
    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress_rx.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Resolve parents once, then submit every spec in order.
    ///
    /// Fatal input and parent errors are returned before any ad is attempted.
    /// Per-item failures are recorded in the report instead.
    pub async fn run(
        &self,
        specs: &[AdSpecification],
        media: &[MediaAsset],
        parents: &ParentInputs,
        template: &CreativeTemplate,
    ) -> LaunchResult<BulkReport> {
        if self.state() != RunState::Idle {
            return Err(already_started());
        }
        if specs.is_empty() {
            return Err(LaunchError::InvalidCreativeInput("no ad specifications to submit".into()));
        }
        template.validate()?;
        plan_parents(parents)?;

        let started = self.state.send_if_modified(|state| {
            if *state == RunState::Idle {
                *state = RunState::ResolvingParents;
                true
            } else {
                false
            }
        });
        let publisher = self.progress_tx.lock().take();
        let (true, Some(publisher)) = (started, publisher) else {
            return Err(already_started());
        };

        let mut tracker = ProgressTracker::with_publisher(publisher);
        tracker.on_run_start(specs.len());
        tracker.set_status("Resolving campaign and ad set...");

        let refs = match self.resolver.resolve(parents).await {
            Ok(refs) => refs,
            Err(e) => {
                error!(error = %e, "Parent resolution failed, no ads submitted");
                tracker.set_status(format!("Failed: {e}"));
                self.state.send_replace(RunState::ParentsFailed);
                return Err(e);
            }
        };
        info!(
            campaign_id = %refs.campaign_remote_id,
            ad_set_id = %refs.ad_set_remote_id,
            total = specs.len(),
            "Parents resolved, submitting ads"
        );

        self.state.send_replace(RunState::SubmittingItems);
        let results = self
            .engine
            .submit_all(specs, media, &refs, template, &mut tracker)
            .await;
        tracker.on_run_complete();
        self.state.send_replace(RunState::Complete);

        let summary = summarize(&results);
        info!(
            success = summary.success_count,
            failed = summary.failure_count,
            "Bulk submission complete"
        );
        Ok(BulkReport {
            parents: refs,
            results,
            summary,
        })
    }

    /// Expand and run a prepared request in one call.
    pub async fn run_request(&self, request: &BulkSubmissionRequest) -> LaunchResult<BulkReport> {
        let specs = request.prepare()?;
        self.run(&specs, &request.media, &request.parents, &request.template)
            .await
    }
}

fn already_started() -> LaunchError {
    LaunchError::Validation("this submission has already been started; start a new run".into())
}
