//! Step and job execution.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{info, warn};

use crate::step::StepConfig;

/// Result of a single step execution.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Step name.
    pub step_name: String,

    /// Exit code (0 = success, -1 = spawn failure or timeout).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether execution succeeded.
    pub success: bool,
}

impl StepResult {
    /// Whether this step passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }
}

/// Executes the steps of one component job, sequentially and fail-fast.
pub struct JobRunner;

impl JobRunner {
    /// Execute a single step in `cwd` and return the result.
    pub async fn execute_step(config: &StepConfig, cwd: &Path) -> anyhow::Result<StepResult> {
        let start = Instant::now();

        if config.command.is_empty() {
            anyhow::bail!("Step {} has empty command", config.name);
        }

        let exe = &config.command[0];
        let args = &config.command[1..];

        // kill_on_drop: a timed-out child must not outlive its step.
        let child = Command::new(exe)
            .args(args)
            .current_dir(cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = if config.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "Step {} timed out after {} seconds",
                    config.name,
                    config.timeout_secs
                )
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;

        Ok(StepResult {
            step_name: config.name.clone(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
            success: output.status.success(),
        })
    }

    /// Run every enabled step in order. Stops at the first failure: an
    /// install failure must abort before the tests ever start, and a
    /// submodule failure before the install.
    pub async fn run(component: &str, steps: &[StepConfig], cwd: &Path) -> Vec<StepResult> {
        let mut results = Vec::new();

        for config in steps {
            if !config.enabled {
                info!(component = %component, step = %config.name, "skipping disabled step");
                continue;
            }

            info!(component = %component, step = %config.name, "executing step");

            let result = match Self::execute_step(config, cwd).await {
                Ok(r) => r,
                Err(e) => {
                    // Spawn failure or timeout: record as a failed step.
                    warn!(component = %component, step = %config.name, error = %e, "step execution error");
                    results.push(StepResult {
                        step_name: config.name.clone(),
                        exit_code: -1,
                        stdout: String::new(),
                        stderr: e.to_string(),
                        duration_ms: 0,
                        success: false,
                    });
                    break;
                }
            };

            let passed = result.passed();
            results.push(result);
            if !passed {
                break;
            }
        }

        results
    }
}
