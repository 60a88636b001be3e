//! Structured observability hooks for workflow lifecycle events.
//!
//! Emitted at `info!` level; format and filtering are controlled by
//! [`crate::telemetry::init_tracing`].

use tracing::info;

/// Job-scoped tracing span.
///
/// Attach with `tracing::Instrument` rather than entering a guard: jobs run
/// concurrently on one task, and a guard held across an await would leak
/// the span onto whichever job future is polled next.
pub fn job_span(component: &str) -> tracing::Span {
    tracing::info_span!("selci.job", component = %component)
}

/// Emit event: workflow run started.
pub fn emit_workflow_started(run_id: &str, tag: &str, git_sha: &str) {
    info!(event = "workflow.started", run_id = %run_id, tag = %tag, git_sha = %git_sha);
}

/// Emit event: workflow run finished.
pub fn emit_workflow_finished(run_id: &str, duration_ms: u64, success: bool) {
    info!(
        event = "workflow.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        success = success,
    );
}

/// Emit event: change gate evaluated for a component.
pub fn emit_gate_evaluated(component: &str, changed: bool, matched: usize) {
    info!(
        event = "gate.evaluated",
        component = %component,
        changed = changed,
        matched = matched,
    );
}

/// Emit event: component job skipped (gate said unchanged).
pub fn emit_job_skipped(component: &str) {
    info!(event = "job.skipped", component = %component);
}

/// Emit event: component job finished.
pub fn emit_job_finished(component: &str, duration_ms: u64, success: bool) {
    info!(
        event = "job.finished",
        component = %component,
        duration_ms = duration_ms,
        success = success,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_span_create() {
        // Just ensure job_span doesn't panic
        let _span = job_span("dsl");
    }
}
