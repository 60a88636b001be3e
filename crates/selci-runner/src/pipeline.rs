//! Workflow orchestration: trigger evaluation, change gating, cache
//! restore/save, and concurrent job execution.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use selci_core::cachekey::{CacheKey, CacheStore};
use selci_core::gate::{ChangeGate, ChangeVerdict};
use selci_core::obs;
use selci_core::vcs::GitCli;
use selci_core::workflow::{ComponentConfig, WorkflowConfig};

use crate::job::JobRunner;
use crate::report::{JobReport, JobStatus, StepReport, WorkflowReport};
use crate::step::StepConfig;

/// Dry-run verdict for one component job.
#[derive(Debug, Clone, Serialize)]
pub struct JobPlan {
    pub component: String,
    pub path: String,
    pub changed: bool,
    /// True only when the tag triggers the workflow and the gate says
    /// changed.
    pub would_run: bool,
}

/// Dry-run verdict for the whole workflow.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub tag: String,
    pub triggered: bool,
    pub jobs: Vec<JobPlan>,
}

/// One component job, resolved and ready to execute.
enum PreparedJob {
    /// Gate said unchanged: report only, nothing runs.
    Skip(Box<JobReport>),
    Run {
        component: ComponentConfig,
        gate: ChangeVerdict,
        cache_key: Option<CacheKey>,
        cache_hit: bool,
        steps: Vec<StepConfig>,
    },
}

/// Orchestrates a workflow run over one repository checkout.
pub struct WorkflowRunner {
    config: WorkflowConfig,
    repo_root: PathBuf,
}

impl WorkflowRunner {
    pub fn new(config: WorkflowConfig, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            repo_root: repo_root.into(),
        }
    }

    /// Evaluate trigger and gates without executing anything.
    pub fn plan(&self, tag: &str) -> anyhow::Result<PlanReport> {
        let triggered = self.config.matches_tag(tag)?;
        let git = GitCli::new(&self.repo_root);

        let mut jobs = Vec::new();
        for component in &self.config.components {
            let verdict =
                ChangeGate::evaluate(&git, &component.path, &self.config.base_branch, "HEAD")
                    .with_context(|| format!("gate failed for component '{}'", component.name))?;
            jobs.push(JobPlan {
                component: component.name.clone(),
                path: component.path.clone(),
                changed: verdict.changed,
                would_run: triggered && verdict.changed,
            });
        }

        Ok(PlanReport {
            tag: tag.to_string(),
            triggered,
            jobs,
        })
    }

    /// Execute the workflow for a tag.
    ///
    /// * `only` — restrict to the named components (empty = all).
    /// * `cache` — install memoization store; restored read-only before
    ///   jobs start, written only after a job passes.
    ///
    /// Jobs run concurrently with no ordering guarantee; steps within a
    /// job run sequentially and fail-fast.
    pub async fn run(
        &self,
        tag: &str,
        only: &[String],
        cache: &CacheStore,
    ) -> anyhow::Result<WorkflowReport> {
        if !self.config.matches_tag(tag)? {
            anyhow::bail!(
                "tag '{}' does not match trigger pattern '{}'",
                tag,
                self.config.tag_pattern
            );
        }

        let git = GitCli::new(&self.repo_root);
        let git_sha = git.head_sha().context("cannot resolve HEAD")?;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        obs::emit_workflow_started(&run_id, tag, &git_sha);

        let selected = self.select_components(only)?;

        // Resolve gates and cache state up front; the comparisons are
        // read-only and cheap next to the jobs themselves.
        let mut prepared = Vec::new();
        for component in selected {
            prepared.push(self.prepare_job(&git, component, cache)?);
        }

        // Jobs are isolated from each other; run them concurrently.
        let jobs = join_all(
            prepared
                .into_iter()
                .map(|job| self.execute_job(job, cache)),
        )
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let success = jobs.iter().all(|j| j.ok());
        obs::emit_workflow_finished(&run_id, duration_ms, success);

        Ok(WorkflowReport {
            run_id,
            tag: tag.to_string(),
            git_sha,
            base_branch: self.config.base_branch.clone(),
            started_at,
            duration_ms,
            success,
            jobs,
        })
    }

    fn select_components(&self, only: &[String]) -> anyhow::Result<Vec<ComponentConfig>> {
        if only.is_empty() {
            return Ok(self.config.components.clone());
        }
        only.iter()
            .map(|name| Ok(self.config.component(name)?.clone()))
            .collect()
    }

    fn prepare_job(
        &self,
        git: &GitCli,
        component: ComponentConfig,
        cache: &CacheStore,
    ) -> anyhow::Result<PreparedJob> {
        let gate = ChangeGate::evaluate(git, &component.path, &self.config.base_branch, "HEAD")
            .with_context(|| format!("gate failed for component '{}'", component.name))?;
        obs::emit_gate_evaluated(&component.name, gate.changed, gate.matched.len());

        if !gate.changed {
            obs::emit_job_skipped(&component.name);
            return Ok(PreparedJob::Skip(Box::new(JobReport {
                component: component.name.clone(),
                path: component.path.clone(),
                image: component.image.clone(),
                status: JobStatus::Skipped,
                gate,
                cache_key: None,
                cache_hit: false,
                steps: vec![],
                duration_ms: 0,
            })));
        }

        let inputs = self.config.cache_inputs(&component);
        let cache_key = if inputs.is_empty() {
            None
        } else {
            Some(
                CacheKey::compute(&self.repo_root, &inputs)
                    .with_context(|| format!("cache key for component '{}'", component.name))?,
            )
        };
        let cache_hit = cache_key.as_ref().is_some_and(|key| cache.restore(key));

        let timeout = component.step_timeout_secs;
        let mut steps = Vec::new();
        if component.submodules {
            steps.push(StepConfig::submodule_init(timeout));
        }
        if let Some(install) = &component.install {
            if cache_hit {
                info!(component = %component.name, key = %cache_key.as_ref().map(|k| k.short().to_string()).unwrap_or_default(), "cache hit, skipping install");
            } else {
                steps.push(StepConfig::install(install.clone(), timeout));
            }
        }
        steps.push(StepConfig::test(component.test.clone(), timeout));

        Ok(PreparedJob::Run {
            component,
            gate,
            cache_key,
            cache_hit,
            steps,
        })
    }

    async fn execute_job(&self, job: PreparedJob, cache: &CacheStore) -> JobReport {
        match job {
            PreparedJob::Skip(report) => *report,
            PreparedJob::Run {
                component,
                gate,
                cache_key,
                cache_hit,
                steps,
            } => {
                // Instrument instead of entering a guard: holding an
                // EnteredSpan across the await would misattribute events
                // from concurrently polled sibling jobs.
                let span = obs::job_span(&component.name);
                async move {
                    let start = Instant::now();

                    let results = JobRunner::run(&component.name, &steps, &self.repo_root).await;
                    let passed = results.iter().all(|r| r.passed());
                    let duration_ms = start.elapsed().as_millis() as u64;
                    obs::emit_job_finished(&component.name, duration_ms, passed);

                    if passed && !cache_hit {
                        if let Some(key) = &cache_key {
                            // Memoization only: a failed save must not fail a
                            // green job.
                            if let Err(e) = cache.save(key) {
                                warn!(component = %component.name, error = %e, "cache save failed");
                            }
                        }
                    }

                    JobReport {
                        component: component.name,
                        path: component.path,
                        image: component.image,
                        status: if passed {
                            JobStatus::Passed
                        } else {
                            JobStatus::Failed
                        },
                        gate,
                        cache_key: cache_key.map(|k| k.as_str().to_string()),
                        cache_hit,
                        steps: results.into_iter().map(StepReport::from).collect(),
                        duration_ms,
                    }
                }
                .instrument(span)
                .await
            }
        }
    }
}
