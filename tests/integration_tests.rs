//! Integration tests for the copydesk CLI.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper to create a copydesk Command
fn copydesk() -> Command {
    let mut cmd = cargo_bin_cmd!("copydesk");
    // Keep host env out of the way so tests are deterministic.
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("GITHUB_OWNER")
        .env_remove("GITHUB_REPO")
        .env_remove("GITHUB_BRANCH")
        .env_remove("ADMIN_SESSION_TOKEN");
    cmd
}

mod cli_basics {
    use super::*;

    #[test]
    fn test_copydesk_help() {
        copydesk().arg("--help").assert().success();
    }

    #[test]
    fn test_copydesk_version() {
        copydesk().arg("--version").assert().success();
    }

    #[test]
    fn test_serve_help_lists_flags() {
        copydesk()
            .args(["serve", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--port"))
            .stdout(predicate::str::contains("--init"))
            .stdout(predicate::str::contains("--dev"));
    }
}

mod serve_init {
    use super::*;

    #[test]
    fn test_serve_init_creates_database() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("data/content.db");

        copydesk()
            .current_dir(dir.path())
            .args(["serve", "--init", "--db"])
            .arg(&db_path)
            .assert()
            .success()
            .stdout(predicate::str::contains("Content database initialized"));

        assert!(db_path.exists());
    }

    #[test]
    fn test_serve_init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("content.db");

        for _ in 0..2 {
            copydesk()
                .current_dir(dir.path())
                .args(["serve", "--init", "--db"])
                .arg(&db_path)
                .assert()
                .success();
        }
    }
}

mod serve_config {
    use super::*;

    #[test]
    fn test_serve_without_session_token_fails_with_hint() {
        let dir = TempDir::new().unwrap();
        copydesk()
            .current_dir(dir.path())
            .args(["serve", "--db", "content.db"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("ADMIN_SESSION_TOKEN"));
    }

    #[test]
    fn test_serve_without_github_config_fails_with_hint() {
        let dir = TempDir::new().unwrap();
        copydesk()
            .current_dir(dir.path())
            .env("ADMIN_SESSION_TOKEN", "secret")
            .args(["serve", "--db", "content.db"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("GITHUB_TOKEN"));
    }
}
