//! Bulk ad submission pipeline: permutation expansion, parent resolution,
//! sequential submission and result aggregation.

pub mod engine;
pub mod expander;
pub mod progress;
pub mod resolver;
pub mod runner;

pub use engine::{EngineSettings, SubmissionEngine};
pub use expander::PermutationExpander;
pub use progress::{BatchSummary, FailureDetail, ProgressTracker};
pub use resolver::{plan_parents, ParentResolver};
pub use runner::{BulkReport, BulkSubmission, BulkSubmissionRequest, RunState};
