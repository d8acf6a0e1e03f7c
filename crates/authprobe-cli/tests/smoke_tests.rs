//! Smoke tests for the authprobe CLI
//!
//! None of these launch a browser: they cover argument handling, listing and
//! the failures that happen before Chromium starts.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the authprobe binary
fn authprobe() -> Command {
    let mut cmd = Command::cargo_bin("authprobe").expect("authprobe binary should exist");
    cmd.env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    authprobe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    authprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_no_args_fails() {
    authprobe().assert().failure();
}

#[test]
fn test_run_subcommand_help() {
    authprobe()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--fail-fast"))
        .stdout(predicate::str::contains("--screenshot-dir"))
        .stdout(predicate::str::contains("--report"));
}

// ============================================================================
// list
// ============================================================================

#[test]
fn test_list_all() {
    authprobe()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("root_redirects_to_authorize"))
        .stdout(predicate::str::contains("email_go_back"))
        .stdout(predicate::str::contains("@regression"));
}

#[test]
fn test_list_smoke_only() {
    let output = authprobe()
        .args(["list", "--tag", "@smoke"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    assert_eq!(stdout.lines().count(), 6);
    assert!(!stdout.contains("@regression"));
}

#[test]
fn test_list_grep() {
    authprobe()
        .args(["list", "--grep", "sso"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sso_redirects_to_okta"))
        .stdout(predicate::str::contains("sso_rejects_wrong_password"))
        .stdout(predicate::str::contains("github").not());
}

#[test]
fn test_unknown_tag_rejected() {
    authprobe()
        .args(["list", "--tag", "nightly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nightly"));
}

// ============================================================================
// run (pre-launch failures)
// ============================================================================

#[test]
fn test_run_with_no_matching_scenarios() {
    authprobe()
        .args(["run", "--grep", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scenarios match"));
}

#[test]
fn test_run_rejects_bad_base_url() {
    authprobe()
        .args(["run", "--base-url", "ftp://insomnia.rest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_url"));
}

#[test]
fn test_run_rejects_bad_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("authprobe.yaml");
    fs::write(&path, "test_data:\n  wrong_code: \"12\"\n").unwrap();

    authprobe()
        .args(["run", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_run_rejects_bad_env_timeout() {
    authprobe()
        .args(["run", "--tag", "smoke"])
        .env("AUTHPROBE_ACTION_TIMEOUT_MS", "soon")
        .assert()
        .failure()
        .stderr(predicate::str::contains("AUTHPROBE_ACTION_TIMEOUT_MS"));
}
