//! Command-line tests for the `tp` binary
//!
//! Only subcommands that need no API keys are exercised here.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Write a config pointing the session store into `dir`
fn write_config(dir: &Path) -> std::path::PathBuf {
    let config = dir.join("tripplanner.yml");
    let sessions = dir.join("sessions");
    fs::write(
        &config,
        format!("log-level: debug\nstorage:\n  sessions-dir: {}\n", sessions.display()),
    )
    .unwrap();
    config
}

fn tp(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tp").unwrap();
    cmd.env("XDG_DATA_HOME", dir).env("XDG_CONFIG_HOME", dir).current_dir(dir);
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    tp(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("choose"))
        .stdout(predicate::str::contains("resume"))
        .stdout(predicate::str::contains("API Keys:"));
}

#[test]
fn test_show_missing_session_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());
    tp(temp.path())
        .args(["-c", config.to_str().unwrap(), "show", "nope-trip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session not found: nope-trip"));
}

#[test]
fn test_list_empty_store() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());
    tp(temp.path())
        .args(["-c", config.to_str().unwrap(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions."));
}

#[test]
fn test_start_without_api_keys_fails_fast() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("tripplanner.yml");
    fs::write(
        &config,
        format!(
            "llm:\n  api-key-env: TP_CLI_TEST_UNSET_LLM_KEY\nstorage:\n  sessions-dir: {}\n",
            temp.path().join("sessions").display()
        ),
    )
    .unwrap();

    tp(temp.path())
        .args([
            "-c",
            config.to_str().unwrap(),
            "start",
            "--from",
            "Austin",
            "--to",
            "Paris",
            "--date",
            "2026-05-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TP_CLI_TEST_UNSET_LLM_KEY"));
}

#[test]
fn test_start_rejects_malformed_date() {
    let temp = TempDir::new().unwrap();
    tp(temp.path())
        .args(["start", "--from", "Austin", "--to", "Paris", "--date", "tomorrow"])
        .assert()
        .failure();
}
