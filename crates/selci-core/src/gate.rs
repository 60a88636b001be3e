//! Change gate: should a component's test job run for this revision?
//!
//! The gate answers "did anything under path P change relative to the base
//! branch tip?" as an explicit boolean verdict. Shell consumers that still
//! expect the historical `true`/`false` token get it from the CLI, not from
//! this module.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SelciError};
use crate::vcs::Vcs;

/// Outcome of a change-gate evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeVerdict {
    /// Component path the gate was evaluated for.
    pub component_path: String,

    /// Whether anything under the component path changed.
    pub changed: bool,

    /// The changed paths that fall under the component (empty if unchanged).
    pub matched: Vec<String>,
}

/// Change-gate evaluation.
pub struct ChangeGate;

impl ChangeGate {
    /// Evaluate the gate for `component_path` between `base` and `head`.
    ///
    /// Errors (never a silent "unchanged") when:
    /// - `component_path` is empty or absent from the working tree
    /// - either reference cannot be resolved (e.g. shallow clone missing
    ///   the base branch)
    ///
    /// Matching is prefix-based at path-segment granularity: a changed file
    /// `dsl2/x.py` does not flip the gate for component `dsl`. Deletions and
    /// renames count because the backend reports both sides of a rename.
    pub fn evaluate(
        vcs: &dyn Vcs,
        component_path: &str,
        base: &str,
        head: &str,
    ) -> Result<ChangeVerdict> {
        let component = normalize(component_path);
        if component.is_empty() {
            return Err(SelciError::InvalidWorkflow(
                "component path cannot be empty".to_string(),
            ));
        }
        if !vcs.path_exists(Path::new(&component)) {
            return Err(SelciError::ComponentPathMissing(component.into()));
        }

        let base_sha = vcs.resolve_ref(base)?;
        let head_sha = vcs.resolve_ref(head)?;

        let matched: Vec<String> = vcs
            .changed_paths(&base_sha, &head_sha)?
            .into_iter()
            .filter(|p| is_under(p, &component))
            .collect();

        let verdict = ChangeVerdict {
            component_path: component,
            changed: !matched.is_empty(),
            matched,
        };

        tracing::debug!(
            component = %verdict.component_path,
            changed = verdict.changed,
            matched = verdict.matched.len(),
            "gate evaluated"
        );

        Ok(verdict)
    }
}

/// Strip trailing slashes and leading "./" from a component path.
fn normalize(path: &str) -> String {
    path.trim_start_matches("./")
        .trim_end_matches('/')
        .to_string()
}

/// Segment-boundary prefix test: `path` is `component` itself or lies
/// strictly inside it. Substring matches ("dsl" vs "dsl2") do not count.
fn is_under(path: &str, component: &str) -> bool {
    path == component
        || path
            .strip_prefix(component)
            .is_some_and(|rest| rest.starts_with('/'))
}
