//! Integration tests for the change gate against real git repositories.

use std::path::Path;
use std::process::Command;

use selci_core::{ChangeGate, GitCli, SelciError};

fn run_git(repo_dir: &Path, args: &[&str]) {
    let output = Command::new("git")
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

/// Repository with three components, each with one committed file.
fn make_component_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    run_git(dir.path(), &["init", "-b", "main"]);
    run_git(dir.path(), &["config", "user.name", "test-user"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);

    for component in ["dsl", "dsl2", "driver", "fv3core"] {
        std::fs::create_dir_all(dir.path().join(component).join("tests")).unwrap();
        std::fs::write(dir.path().join(component).join("setup.py"), "pkg\n").unwrap();
    }
    std::fs::write(dir.path().join("README.md"), "readme\n").unwrap();
    run_git(dir.path(), &["add", "."]);
    run_git(dir.path(), &["commit", "-m", "base"]);
    dir
}

fn commit_all(repo: &Path, message: &str) {
    run_git(repo, &["add", "-A"]);
    run_git(repo, &["commit", "-m", message]);
}

#[test]
fn modified_test_file_flips_only_its_component() {
    let repo = make_component_repo();
    run_git(repo.path(), &["checkout", "-b", "feature"]);
    std::fs::write(repo.path().join("dsl/tests/test_x.py"), "def test(): pass\n").unwrap();
    commit_all(repo.path(), "add dsl test");

    let git = GitCli::new(repo.path());

    let dsl = ChangeGate::evaluate(&git, "dsl", "main", "HEAD").unwrap();
    assert!(dsl.changed);
    assert_eq!(dsl.matched, vec!["dsl/tests/test_x.py".to_string()]);

    let driver = ChangeGate::evaluate(&git, "driver", "main", "HEAD").unwrap();
    assert!(!driver.changed);

    // Segment matching: the dsl change must not leak into dsl2 or vice versa.
    let dsl2 = ChangeGate::evaluate(&git, "dsl2", "main", "HEAD").unwrap();
    assert!(!dsl2.changed);
}

#[test]
fn root_readme_change_flips_no_component() {
    let repo = make_component_repo();
    run_git(repo.path(), &["checkout", "-b", "docs"]);
    std::fs::write(repo.path().join("README.md"), "updated\n").unwrap();
    commit_all(repo.path(), "update readme");

    let git = GitCli::new(repo.path());
    for component in ["dsl", "driver", "fv3core"] {
        let verdict = ChangeGate::evaluate(&git, component, "main", "HEAD").unwrap();
        assert!(!verdict.changed, "{component} should be unchanged");
    }
}

#[test]
fn deletion_counts_as_change() {
    let repo = make_component_repo();
    run_git(repo.path(), &["checkout", "-b", "cleanup"]);
    std::fs::remove_file(repo.path().join("fv3core/setup.py")).unwrap();
    commit_all(repo.path(), "drop fv3core setup");

    let git = GitCli::new(repo.path());
    let verdict = ChangeGate::evaluate(&git, "fv3core", "main", "HEAD").unwrap();
    assert!(verdict.changed);
    assert_eq!(verdict.matched, vec!["fv3core/setup.py".to_string()]);
}

#[test]
fn rename_counts_for_both_locations() {
    let repo = make_component_repo();
    run_git(repo.path(), &["checkout", "-b", "move"]);
    run_git(
        repo.path(),
        &["mv", "driver/setup.py", "fv3core/driver_setup.py"],
    );
    commit_all(repo.path(), "move file across components");

    let git = GitCli::new(repo.path());
    let source = ChangeGate::evaluate(&git, "driver", "main", "HEAD").unwrap();
    let target = ChangeGate::evaluate(&git, "fv3core", "main", "HEAD").unwrap();
    assert!(source.changed, "old location must count");
    assert!(target.changed, "new location must count");
}

#[test]
fn missing_base_branch_fails_loudly() {
    let repo = make_component_repo();
    let git = GitCli::new(repo.path());
    let result = ChangeGate::evaluate(&git, "dsl", "no-such-branch", "HEAD");
    assert!(matches!(result, Err(SelciError::RefResolution { .. })));
}

#[test]
fn missing_component_path_fails_loudly() {
    let repo = make_component_repo();
    let git = GitCli::new(repo.path());
    let result = ChangeGate::evaluate(&git, "physics", "main", "HEAD");
    assert!(matches!(result, Err(SelciError::ComponentPathMissing(_))));
}

#[test]
fn verdict_is_stable_across_invocations() {
    let repo = make_component_repo();
    run_git(repo.path(), &["checkout", "-b", "feature"]);
    std::fs::write(repo.path().join("driver/new.py"), "x\n").unwrap();
    commit_all(repo.path(), "add driver file");

    let git = GitCli::new(repo.path());
    let first = ChangeGate::evaluate(&git, "driver", "main", "HEAD").unwrap();
    let second = ChangeGate::evaluate(&git, "driver", "main", "HEAD").unwrap();
    assert_eq!(first.changed, second.changed);
    assert_eq!(first.matched, second.matched);
}
