//! selci - Selective CI command-line interface
//!
//! ## Commands
//!
//! - `gate`: print whether a component path changed relative to the base branch
//! - `plan`: show which component jobs would run for a tag
//! - `run`: execute the workflow and write a JSON run report
//! - `cache-key`: print a component's dependency cache key

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use selci_core::cachekey::{CacheKey, CacheStore};
use selci_core::gate::ChangeGate;
use selci_core::vcs::{is_git_repo, GitCli};
use selci_core::workflow::WorkflowConfig;
use selci_runner::{JobStatus, WorkflowRunner};

#[derive(Parser)]
#[command(name = "selci")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Selective CI: run component test jobs only when they changed", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the change gate for a component path
    ///
    /// Prints `true` when anything under the path changed relative to the
    /// base branch tip, `false` otherwise. Resolution failures (missing
    /// path, unknown base reference) exit non-zero.
    Gate {
        /// Component subdirectory to check
        path: String,

        /// Base reference (default: workflow base_branch, else `main`)
        #[arg(short, long)]
        base: Option<String>,

        /// Repository root
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Workflow file supplying the implicit base branch
        #[arg(short, long, default_value = "selci.toml")]
        config: PathBuf,
    },

    /// Show which component jobs would run for a tag, without executing
    Plan {
        /// Tag being built (matched against the trigger pattern)
        #[arg(short, long)]
        tag: String,

        /// Workflow file
        #[arg(short, long, default_value = "selci.toml")]
        config: PathBuf,

        /// Repository root
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },

    /// Execute the workflow for a tag
    Run {
        /// Tag being built (matched against the trigger pattern)
        #[arg(short, long)]
        tag: String,

        /// Restrict to specific components (default: all)
        #[arg(long = "component")]
        components: Vec<String>,

        /// Workflow file
        #[arg(short, long, default_value = "selci.toml")]
        config: PathBuf,

        /// Repository root
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Install-cache directory
        #[arg(long, default_value = ".selci/cache")]
        cache_dir: PathBuf,

        /// Write the JSON run report here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the dependency cache key for a component
    CacheKey {
        /// Component name
        component: String,

        /// Workflow file
        #[arg(short, long, default_value = "selci.toml")]
        config: PathBuf,

        /// Repository root
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    selci_core::init_tracing(cli.log_json, level);

    match cli.command {
        Commands::Gate {
            path,
            base,
            repo,
            config,
        } => cmd_gate(&path, base.as_deref(), &repo, &config),
        Commands::Plan { tag, config, repo } => cmd_plan(&tag, &config, &repo),
        Commands::Run {
            tag,
            components,
            config,
            repo,
            cache_dir,
            report,
        } => cmd_run(&tag, &components, &config, &repo, &cache_dir, report.as_deref()).await,
        Commands::CacheKey {
            component,
            config,
            repo,
        } => cmd_cache_key(&component, &config, &repo),
    }
}

fn workflow_path(config: &Path, repo: &Path) -> PathBuf {
    if config.is_absolute() {
        config.to_path_buf()
    } else {
        repo.join(config)
    }
}

fn load_workflow(config: &Path, repo: &Path) -> Result<WorkflowConfig> {
    let path = workflow_path(config, repo);
    WorkflowConfig::load(&path).with_context(|| format!("failed to load workflow: {:?}", path))
}

fn require_git_repo(repo: &Path) -> Result<()> {
    if !is_git_repo(repo) {
        anyhow::bail!("not a git repository: {:?}", repo);
    }
    Ok(())
}

/// Evaluate the change gate and print the `true`/`false` token.
fn cmd_gate(path: &str, base: Option<&str>, repo: &Path, config: &Path) -> Result<()> {
    require_git_repo(repo)?;

    // Explicit --base wins; otherwise the workflow file supplies the
    // integration branch; a missing workflow file falls back to `main`,
    // but a present-yet-broken one is an error.
    let base = match base {
        Some(base) => base.to_string(),
        None if workflow_path(config, repo).exists() => load_workflow(config, repo)?.base_branch,
        None => "main".to_string(),
    };

    let git = GitCli::new(repo);
    let verdict = ChangeGate::evaluate(&git, path, &base, "HEAD")
        .with_context(|| format!("gate failed for path '{path}'"))?;

    println!("{}", verdict.changed);
    Ok(())
}

/// Dry-run: trigger and gate verdicts, nothing executed.
fn cmd_plan(tag: &str, config: &Path, repo: &Path) -> Result<()> {
    require_git_repo(repo)?;
    let workflow = load_workflow(config, repo)?;
    let runner = WorkflowRunner::new(workflow, repo);
    let plan = runner.plan(tag)?;

    if !plan.triggered {
        println!("Tag '{}' does not trigger the workflow; no jobs run.", tag);
    }
    for job in &plan.jobs {
        let marker = if job.would_run { "run " } else { "skip" };
        println!("  {} {} ({})", marker, job.component, job.path);
    }
    Ok(())
}

/// Execute the workflow and print per-job summaries.
async fn cmd_run(
    tag: &str,
    components: &[String],
    config: &Path,
    repo: &Path,
    cache_dir: &Path,
    report_path: Option<&Path>,
) -> Result<()> {
    require_git_repo(repo)?;
    let workflow = load_workflow(config, repo)?;
    let cache = CacheStore::new(repo.join(cache_dir)).context("failed to open install cache")?;
    let runner = WorkflowRunner::new(workflow, repo);

    let report = runner
        .run(tag, components, &cache)
        .await
        .context("workflow run failed")?;

    println!("Run ID: {}", report.run_id);
    println!("Git SHA: {}", report.git_sha);
    println!(
        "Status: {}",
        if report.success { "✓ PASSED" } else { "✗ FAILED" }
    );
    println!("Duration: {}ms", report.duration_ms);
    println!();

    for job in &report.jobs {
        let marker = match job.status {
            JobStatus::Passed => "✓",
            JobStatus::Failed => "✗",
            JobStatus::Skipped => "-",
        };
        let cache_note = if job.cache_hit { ", cache hit" } else { "" };
        println!(
            "  {} {} ({} steps, {}ms{})",
            marker,
            job.component,
            job.steps.len(),
            job.duration_ms,
            cache_note
        );
        for step in &job.steps {
            let status = if step.success { "✓" } else { "✗" };
            println!(
                "      {} {} ({}ms, exit code: {})",
                status, step.name, step.duration_ms, step.exit_code
            );
        }
    }

    println!();
    println!(
        "Summary: {} passed, {} failed, {} skipped",
        report.passed_count(),
        report.failed_count(),
        report.skipped_count()
    );

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {:?}", path))?;
        println!("Report written to {:?}", path);
    }

    if report.success {
        Ok(())
    } else {
        anyhow::bail!("{} job(s) failed", report.failed_count())
    }
}

/// Print the cache key a component's install would be memoized under.
fn cmd_cache_key(component: &str, config: &Path, repo: &Path) -> Result<()> {
    let workflow = load_workflow(config, repo)?;
    let component = workflow.component(component)?;

    let inputs = workflow.cache_inputs(component);
    if inputs.is_empty() {
        anyhow::bail!(
            "component '{}' declares no lockfile or manifest",
            component.name
        );
    }

    let key = CacheKey::compute(repo, &inputs)?;
    println!("{key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(output.status.success());
    }

    fn make_repo_with_workflow() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);

        std::fs::create_dir_all(dir.path().join("dsl")).unwrap();
        std::fs::write(dir.path().join("dsl/requirements.txt"), "gt4py\n").unwrap();
        std::fs::write(dir.path().join("constraints.txt"), "pins\n").unwrap();
        std::fs::write(
            dir.path().join("selci.toml"),
            r#"
base_branch = "main"
lockfile = "constraints.txt"

[[components]]
name = "dsl"
path = "dsl"
manifest = "dsl/requirements.txt"
test = ["echo", "ok"]
"#,
        )
        .unwrap();
        run_git(dir.path(), &["add", "."]);
        run_git(dir.path(), &["commit", "-m", "base"]);
        dir
    }

    #[test]
    fn test_cmd_gate_unchanged_prints_false() {
        let repo = make_repo_with_workflow();
        // HEAD == main tip: nothing changed.
        let result = cmd_gate("dsl", None, repo.path(), Path::new("selci.toml"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_cmd_gate_missing_path_errors() {
        let repo = make_repo_with_workflow();
        let result = cmd_gate("physics", None, repo.path(), Path::new("selci.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_cmd_gate_outside_repo_errors() {
        let plain = tempfile::tempdir().unwrap();
        let result = cmd_gate("dsl", None, plain.path(), Path::new("selci.toml"));
        let err = result.expect_err("non-repo directory must error");
        assert!(err.to_string().contains("not a git repository"));
    }

    #[test]
    fn test_cmd_plan_outside_repo_errors() {
        let plain = tempfile::tempdir().unwrap();
        let result = cmd_plan("v1.0.0", Path::new("selci.toml"), plain.path());
        let err = result.expect_err("non-repo directory must error");
        assert!(err.to_string().contains("not a git repository"));
    }

    #[test]
    fn test_cmd_gate_malformed_config_errors() {
        let repo = make_repo_with_workflow();
        std::fs::write(repo.path().join("selci.toml"), "base_branch = [not toml").unwrap();
        let result = cmd_gate("dsl", None, repo.path(), Path::new("selci.toml"));
        assert!(result.is_err(), "broken workflow file must not be ignored");
    }

    #[test]
    fn test_cmd_gate_missing_config_falls_back_to_main() {
        let repo = make_repo_with_workflow();
        std::fs::remove_file(repo.path().join("selci.toml")).unwrap();
        let result = cmd_gate("dsl", None, repo.path(), Path::new("selci.toml"));
        assert!(result.is_ok(), "gate failed: {:?}", result.err());
    }

    #[test]
    fn test_cmd_cache_key_prints_stable_key() {
        let repo = make_repo_with_workflow();
        let result = cmd_cache_key("dsl", Path::new("selci.toml"), repo.path());
        assert!(result.is_ok(), "cache key failed: {:?}", result.err());
    }

    #[test]
    fn test_cmd_cache_key_unknown_component() {
        let repo = make_repo_with_workflow();
        let result = cmd_cache_key("physics", Path::new("selci.toml"), repo.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_cmd_plan_on_fixture() {
        let repo = make_repo_with_workflow();
        let result = cmd_plan("v1.0.0", Path::new("selci.toml"), repo.path());
        assert!(result.is_ok(), "plan failed: {:?}", result.err());
    }
}
