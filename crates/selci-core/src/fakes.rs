//! In-memory fakes for the VCS trait (testing only)
//!
//! Provides `MemoryVcs`, which satisfies the [`crate::vcs::Vcs`] contract
//! from fixed data without touching a real repository.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{Result, SelciError};
use crate::vcs::Vcs;

/// In-memory `Vcs` backed by fixed refs, changed paths, and worktree paths.
#[derive(Debug, Default)]
pub struct MemoryVcs {
    refs: HashMap<String, String>,
    changed: Vec<String>,
    worktree: HashSet<String>,
}

impl MemoryVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolvable reference.
    pub fn with_ref(mut self, name: &str, sha: &str) -> Self {
        self.refs.insert(name.to_string(), sha.to_string());
        self
    }

    /// Register the paths reported as changed between any two refs.
    pub fn with_changed(mut self, paths: &[&str]) -> Self {
        self.changed = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Register a path that exists in the working tree.
    pub fn with_path(mut self, path: &str) -> Self {
        self.worktree.insert(path.to_string());
        self
    }
}

impl Vcs for MemoryVcs {
    fn resolve_ref(&self, reference: &str) -> Result<String> {
        self.refs
            .get(reference)
            .cloned()
            .ok_or_else(|| SelciError::RefResolution {
                reference: reference.to_string(),
                message: "unknown reference".to_string(),
            })
    }

    fn changed_paths(&self, base: &str, head: &str) -> Result<Vec<String>> {
        // Both endpoints must be known commit-ish (a registered ref name or
        // a SHA a ref resolves to), mirroring the real backend.
        for endpoint in [base, head] {
            let known = self.refs.contains_key(endpoint)
                || self.refs.values().any(|sha| sha == endpoint);
            if !known {
                return Err(SelciError::RefResolution {
                    reference: endpoint.to_string(),
                    message: "unknown reference".to_string(),
                });
            }
        }
        Ok(self.changed.clone())
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.worktree.contains(&path.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_vcs_resolves_registered_refs() {
        let vcs = MemoryVcs::new().with_ref("main", "abc123");
        assert_eq!(vcs.resolve_ref("main").unwrap(), "abc123");
        assert!(vcs.resolve_ref("other").is_err());
    }

    #[test]
    fn memory_vcs_requires_resolvable_endpoints() {
        let vcs = MemoryVcs::new()
            .with_ref("main", "a")
            .with_changed(&["dsl/setup.py"]);
        assert!(vcs.changed_paths("main", "HEAD").is_err());

        let vcs = vcs.with_ref("HEAD", "b");
        assert_eq!(
            vcs.changed_paths("main", "HEAD").unwrap(),
            vec!["dsl/setup.py".to_string()]
        );
    }
}
