//! selci-runner - Workflow execution for selci
//!
//! Turns a validated workflow definition into running jobs:
//! - Evaluates the tag trigger and the per-component change gate
//! - Skips installs behind content-derived cache keys
//! - Executes job steps as subprocesses, fail-fast, jobs concurrently

pub mod job;
pub mod pipeline;
pub mod report;
pub mod step;

// Re-export key types
pub use job::{JobRunner, StepResult};
pub use pipeline::{JobPlan, PlanReport, WorkflowRunner};
pub use report::{JobReport, JobStatus, StepReport, WorkflowReport};
pub use step::StepConfig;
