//! Version-control backend for change detection.
//!
//! The [`Vcs`] trait is the seam between the change gate and the real
//! repository history: production code uses [`GitCli`] (shelling out to
//! `git`), tests inject [`crate::fakes::MemoryVcs`].

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, SelciError};

/// Read-only view of repository history, as needed by the change gate.
pub trait Vcs {
    /// Resolve a symbolic reference (branch, tag, `HEAD`) to a commit SHA.
    ///
    /// Fails if the reference is unknown — e.g. a shallow clone that never
    /// fetched the base branch.
    fn resolve_ref(&self, reference: &str) -> Result<String>;

    /// List the paths of all files that differ between two commits.
    ///
    /// Renames must be reported as an addition plus a deletion so that both
    /// the old and the new location count as changes.
    fn changed_paths(&self, base: &str, head: &str) -> Result<Vec<String>>;

    /// Whether a relative path exists in the current working tree.
    fn path_exists(&self, path: &Path) -> bool;
}

/// `Vcs` implementation backed by the `git` command-line tool.
pub struct GitCli {
    repo_dir: PathBuf,
}

impl GitCli {
    /// Create a backend rooted at `repo_dir`. The directory must be inside
    /// a git work tree; this is not checked here but every query will fail
    /// loudly if it is not.
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    /// Repository root this backend operates on.
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Capture the HEAD commit SHA of the repository.
    pub fn head_sha(&self) -> Result<String> {
        self.resolve_ref("HEAD")
    }

    fn run_git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|e| SelciError::GitError(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SelciError::GitError(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Vcs for GitCli {
    fn resolve_ref(&self, reference: &str) -> Result<String> {
        let revspec = format!("{reference}^{{commit}}");
        let stdout = self
            .run_git(&["rev-parse", "--verify", "--quiet", &revspec])
            .map_err(|e| SelciError::RefResolution {
                reference: reference.to_string(),
                message: e.to_string(),
            })?;

        let sha = stdout.trim().to_string();
        if sha.is_empty() {
            return Err(SelciError::RefResolution {
                reference: reference.to_string(),
                message: "git rev-parse returned empty output".to_string(),
            });
        }
        Ok(sha)
    }

    fn changed_paths(&self, base: &str, head: &str) -> Result<Vec<String>> {
        // --no-renames splits a rename into add + delete, so both the old
        // and the new path count as changed.
        let stdout = self.run_git(&["diff", "--name-only", "--no-renames", base, head])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.repo_dir.join(path).exists()
    }
}

/// Check whether a directory is inside a git work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    #[test]
    fn head_sha_returns_40_hex_chars() {
        let repo = make_git_repo();
        let sha = GitCli::new(repo.path()).head_sha().unwrap();
        assert_eq!(sha.len(), 40, "SHA should be 40 hex chars, got: {sha}");
        assert!(sha.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn resolve_ref_fails_for_unknown_reference() {
        let repo = make_git_repo();
        let result = GitCli::new(repo.path()).resolve_ref("no-such-branch");
        assert!(matches!(result, Err(SelciError::RefResolution { .. })));
    }

    #[test]
    fn resolve_ref_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        let result = GitCli::new(dir.path()).resolve_ref("HEAD");
        assert!(result.is_err());
    }

    #[test]
    fn changed_paths_lists_added_file() {
        let repo = make_git_repo();
        let base = GitCli::new(repo.path()).head_sha().unwrap();

        std::fs::create_dir_all(repo.path().join("dsl")).unwrap();
        std::fs::write(repo.path().join("dsl/setup.py"), "x = 1\n").unwrap();
        run_git(repo.path(), &["add", "."]);
        run_git(repo.path(), &["commit", "-m", "add dsl"]);

        let git = GitCli::new(repo.path());
        let changed = git.changed_paths(&base, "HEAD").unwrap();
        assert_eq!(changed, vec!["dsl/setup.py".to_string()]);
    }

    #[test]
    fn changed_paths_reports_rename_as_both_sides() {
        let repo = make_git_repo();
        std::fs::create_dir_all(repo.path().join("driver")).unwrap();
        std::fs::write(repo.path().join("driver/run.py"), "run\n").unwrap();
        run_git(repo.path(), &["add", "."]);
        run_git(repo.path(), &["commit", "-m", "add driver"]);
        let base = GitCli::new(repo.path()).head_sha().unwrap();

        run_git(
            repo.path(),
            &["mv", "driver/run.py", "driver/main.py"],
        );
        run_git(repo.path(), &["commit", "-m", "rename"]);

        let git = GitCli::new(repo.path());
        let mut changed = git.changed_paths(&base, "HEAD").unwrap();
        changed.sort();
        assert_eq!(
            changed,
            vec!["driver/main.py".to_string(), "driver/run.py".to_string()]
        );
    }

    #[test]
    fn path_exists_checks_worktree() {
        let repo = make_git_repo();
        std::fs::create_dir_all(repo.path().join("fv3core")).unwrap();
        let git = GitCli::new(repo.path());
        assert!(git.path_exists(Path::new("fv3core")));
        assert!(!git.path_exists(Path::new("no-such-dir")));
    }

    #[test]
    fn is_git_repo_detection() {
        let repo = make_git_repo();
        assert!(is_git_repo(repo.path()));
        let plain = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(plain.path()));
    }
}
