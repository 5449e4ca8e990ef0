//! Progress counters and result aggregation for one submission run.

use adlaunch_core::types::{AdSpecification, BatchProgress, SubmissionResult};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureDetail {
    pub display_name: String,
    pub message: String,
}

/// Final tally of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSummary {
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<FailureDetail>,
}

/// Owns the live `BatchProgress` and the ordered result list.
///
/// Every change is published to subscribers as a fresh snapshot.
#[derive(Debug)]
pub struct ProgressTracker {
    progress: BatchProgress,
    results: Vec<SubmissionResult>,
    publisher: Option<watch::Sender<BatchProgress>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            progress: BatchProgress::default(),
            results: Vec::new(),
            publisher: None,
        }
    }

    /// Tracker that publishes snapshots through a watch channel.
    pub fn with_publisher(publisher: watch::Sender<BatchProgress>) -> Self {
        Self {
            publisher: Some(publisher),
            ..Self::new()
        }
    }

    pub fn on_run_start(&mut self, total: usize) {
        self.progress = BatchProgress {
            total_count: total,
            completed_count: 0,
            current_status_text: "Starting...".to_string(),
        };
        self.results.clear();
        self.publish();
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.progress.current_status_text = text.into();
        self.publish();
    }

    pub fn on_item_start(&mut self, spec: &AdSpecification) {
        self.progress.current_status_text = format!(
            "Creating ad {} of {}: {}",
            self.progress.completed_count + 1,
            self.progress.total_count,
            spec.display_name
        );
        self.publish();
    }

    pub fn on_item_done(&mut self, result: SubmissionResult) {
        self.results.push(result);
        self.progress.completed_count += 1;
        self.publish();
    }

    pub fn on_run_complete(&mut self) {
        self.progress.current_status_text = "Complete!".to_string();
        self.publish();
    }

    pub fn progress(&self) -> &BatchProgress {
        &self.progress
    }

    pub fn results(&self) -> &[SubmissionResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<SubmissionResult> {
        self.results
    }

    pub fn summarize(&self) -> BatchSummary {
        summarize(&self.results)
    }

    fn publish(&self) {
        if let Some(publisher) = &self.publisher {
            publisher.send_replace(self.progress.clone());
        }
    }
}

/// Count outcomes and collect failure messages in submission order.
pub fn summarize(results: &[SubmissionResult]) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for result in results {
        if result.is_success() {
            summary.success_count += 1;
        } else {
            summary.failure_count += 1;
            summary.failures.push(FailureDetail {
                display_name: result.display_name.clone(),
                message: result.error_message.clone().unwrap_or_default(),
            });
        }
    }
    summary
}
