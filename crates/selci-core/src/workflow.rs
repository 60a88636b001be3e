//! Workflow definition: which component jobs exist, what triggers them,
//! and what each job runs.
//!
//! Loaded from a `selci.toml` at the repository root:
//!
//! ```toml
//! base_branch = "main"
//! tag_pattern = "^v.*"
//! lockfile = "constraints.txt"
//!
//! [[components]]
//! name = "dsl"
//! path = "dsl"
//! image = "ghcr.io/example/model-ci:latest"
//! manifest = "dsl/requirements.txt"
//! install = ["pip", "install", "-r", "dsl/requirements.txt", "-c", "constraints.txt"]
//! test = ["pytest", "dsl/tests"]
//! submodules = true
//! ```

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SelciError};

/// Default per-step timeout in seconds (30 minutes).
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 1800;

/// Top-level workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowConfig {
    /// Branch whose tip is the change-detection baseline.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Regex a tag must match for jobs to run (no branch triggers exist).
    #[serde(default = "default_tag_pattern")]
    pub tag_pattern: String,

    /// Shared constraints/lock file included in every cache key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lockfile: Option<PathBuf>,

    /// Component jobs.
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

/// One component job: a gated subdirectory with its own install and tests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentConfig {
    /// Job name (unique within the workflow).
    pub name: String,

    /// Relative subdirectory the change gate watches.
    pub path: String,

    /// Container image the CI provider runs this job in. Recorded in
    /// reports; selci does not launch containers itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Per-component dependency manifest, part of the cache key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,

    /// Dependency install command (skipped on a cache hit).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<Vec<String>>,

    /// Test command.
    pub test: Vec<String>,

    /// Whether submodules must be initialized before this job.
    #[serde(default)]
    pub submodules: bool,

    /// Per-step timeout in seconds.
    #[serde(default = "default_step_timeout")]
    pub step_timeout_secs: u64,
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_tag_pattern() -> String {
    "^v.*".to_string()
}

fn default_step_timeout() -> u64 {
    DEFAULT_STEP_TIMEOUT_SECS
}

impl WorkflowConfig {
    /// Load and validate a workflow definition from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a workflow definition from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants. Invalid definitions are fatal.
    pub fn validate(&self) -> Result<()> {
        if self.base_branch.is_empty() {
            return Err(SelciError::InvalidWorkflow(
                "base_branch cannot be empty".to_string(),
            ));
        }
        if self.components.is_empty() {
            return Err(SelciError::InvalidWorkflow(
                "workflow must declare at least one component".to_string(),
            ));
        }

        // Trigger pattern must compile; fail at load, not at dispatch.
        self.compile_tag_pattern()?;

        let mut seen = std::collections::HashSet::new();
        for component in &self.components {
            if component.name.is_empty() {
                return Err(SelciError::InvalidWorkflow(
                    "component name cannot be empty".to_string(),
                ));
            }
            if component.path.is_empty() {
                return Err(SelciError::InvalidWorkflow(format!(
                    "component '{}' has an empty path",
                    component.name
                )));
            }
            if component.test.is_empty() {
                return Err(SelciError::InvalidWorkflow(format!(
                    "component '{}' has no test command",
                    component.name
                )));
            }
            if !seen.insert(component.name.as_str()) {
                return Err(SelciError::InvalidWorkflow(format!(
                    "duplicate component name: {}",
                    component.name
                )));
            }
        }
        Ok(())
    }

    /// Whether a tag triggers this workflow.
    pub fn matches_tag(&self, tag: &str) -> Result<bool> {
        Ok(self.compile_tag_pattern()?.is_match(tag))
    }

    /// Look up a component by name.
    pub fn component(&self, name: &str) -> Result<&ComponentConfig> {
        self.components
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SelciError::UnknownComponent(name.to_string()))
    }

    /// The files whose content forms a component's cache key:
    /// the shared lockfile (if any) plus the component manifest (if any).
    pub fn cache_inputs(&self, component: &ComponentConfig) -> Vec<PathBuf> {
        let mut inputs = Vec::new();
        if let Some(lockfile) = &self.lockfile {
            inputs.push(lockfile.clone());
        }
        if let Some(manifest) = &component.manifest {
            inputs.push(manifest.clone());
        }
        inputs
    }

    fn compile_tag_pattern(&self) -> Result<Regex> {
        Regex::new(&self.tag_pattern).map_err(|source| SelciError::InvalidTagPattern {
            pattern: self.tag_pattern.clone(),
            source,
        })
    }
}
