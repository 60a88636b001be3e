//! Job step definitions.

use serde::{Deserialize, Serialize};

/// Configuration for one job step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Step name.
    pub name: String,

    /// Command to execute (first element is the executable).
    pub command: Vec<String>,

    /// Timeout in seconds (0 = no timeout).
    pub timeout_secs: u64,

    /// Whether this step runs.
    pub enabled: bool,
}

impl StepConfig {
    /// Submodule initialization; must run before install and tests when a
    /// component declares `submodules = true`.
    pub fn submodule_init(timeout_secs: u64) -> Self {
        Self::custom(
            "submodule_init".to_string(),
            vec![
                "git".to_string(),
                "submodule".to_string(),
                "update".to_string(),
                "--init".to_string(),
                "--recursive".to_string(),
            ],
            timeout_secs,
        )
    }

    /// Dependency install step (skipped entirely on a cache hit).
    pub fn install(command: Vec<String>, timeout_secs: u64) -> Self {
        Self::custom("install".to_string(), command, timeout_secs)
    }

    /// Test-suite step.
    pub fn test(command: Vec<String>, timeout_secs: u64) -> Self {
        Self::custom("test".to_string(), command, timeout_secs)
    }

    /// Arbitrary named step.
    pub fn custom(name: String, command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            name,
            command,
            timeout_secs,
            enabled: true,
        }
    }

    /// Disable this step.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
