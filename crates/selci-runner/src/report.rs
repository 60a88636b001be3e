//! Serializable run records for workflow executions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use selci_core::gate::ChangeVerdict;

use crate::job::StepResult;

/// Outcome of one step, as recorded in the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<StepResult> for StepReport {
    fn from(result: StepResult) -> Self {
        Self {
            name: result.step_name,
            exit_code: result.exit_code,
            duration_ms: result.duration_ms,
            success: result.success,
            stdout: result.stdout,
            stderr: result.stderr,
        }
    }
}

/// Final state of a component job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// All steps passed.
    Passed,
    /// A step failed; later steps never ran.
    Failed,
    /// Gate verdict was unchanged; no step ran.
    Skipped,
}

/// Record of one component job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// Component name.
    pub component: String,

    /// Gated subdirectory.
    pub path: String,

    /// Container image declared for this job (metadata only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    pub status: JobStatus,

    /// Gate verdict that admitted or skipped this job.
    pub gate: ChangeVerdict,

    /// Cache key for the install step, when the component declares
    /// dependency files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,

    /// Whether the install was skipped due to a cache hit.
    pub cache_hit: bool,

    pub steps: Vec<StepReport>,

    pub duration_ms: u64,
}

impl JobReport {
    /// Whether this job counts against workflow success. Skipped jobs do
    /// not; the gate deciding "unchanged" is a pass, not a failure.
    pub fn ok(&self) -> bool {
        self.status != JobStatus::Failed
    }
}

/// Record of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    /// Run ID.
    pub run_id: String,

    /// Tag that triggered the run.
    pub tag: String,

    /// Git commit SHA of the revision under test.
    pub git_sha: String,

    /// Baseline branch for change detection.
    pub base_branch: String,

    pub started_at: DateTime<Utc>,

    pub duration_ms: u64,

    /// Logical AND over executed jobs (skipped jobs excluded).
    pub success: bool,

    pub jobs: Vec<JobReport>,
}

impl WorkflowReport {
    pub fn passed_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.status == JobStatus::Passed)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.status == JobStatus::Failed)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.status == JobStatus::Skipped)
            .count()
    }
}
