//! Smoke tests for the escenario binary
//!
//! Runs go through `--backend mock`, so no browser is needed.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn escenario() -> Command {
    let mut cmd = Command::cargo_bin("escenario").expect("escenario binary should exist");
    cmd.env_remove("RUST_LOG")
        .env_remove("ESCENARIO_BASE_URL")
        .env_remove("ESCENARIO_TIMEOUT_MS")
        .env_remove("ESCENARIO_HEADLESS");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    escenario()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    escenario()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_fails() {
    escenario().assert().failure();
}

#[test]
fn test_run_help_mentions_backend() {
    escenario()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--backend"))
        .stdout(predicate::str::contains("--dry-run"));
}

// ============================================================================
// Run
// ============================================================================

#[test]
fn test_mock_run_passes() {
    escenario()
        .args(["--color", "never", "run", "--backend", "mock"])
        .env("ESCENARIO_TIMEOUT_MS", "3000")
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS Successful login"))
        .stdout(predicate::str::contains("PASS Sort by price low to high"))
        .stdout(predicate::str::contains("PASSED 6 scenarios"));
}

#[test]
fn test_mock_run_json_report() {
    let output = escenario()
        .args(["run", "--backend", "mock", "--tag", "cart", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["name"], "storefront");
    assert_eq!(report["scenarios"].as_array().unwrap().len(), 2);
    assert_eq!(report["scenarios"][0]["status"], "passed");
}

#[test]
fn test_dry_run_lists_plan() {
    escenario()
        .args(["run", "--dry-run", "--filter", "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would run 1 scenario(s)"))
        .stdout(predicate::str::contains("When the user logs out from the menu"));
}

#[test]
fn test_filter_matching_nothing_exits_2() {
    escenario()
        .args(["run", "--backend", "mock", "--filter", "checkout"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no scenarios match"));
}

// ============================================================================
// List and config
// ============================================================================

#[test]
fn test_list_shows_tags() {
    escenario()
        .args(["list", "--tag", "smoke"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successful login [@login @smoke]"))
        .stdout(predicate::str::contains("Add item to cart"))
        .stdout(predicate::str::contains("Logout").not());
}

#[test]
fn test_config_prints_yaml_with_overrides() {
    escenario()
        .args(["config", "--headless", "--base-url", "https://shop.test/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url: https://shop.test/"))
        .stdout(predicate::str::contains("kind: headless-chromium"));
}

#[test]
fn test_config_reads_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("escenario.yaml");
    fs::write(&path, "scenario_timeout_ms: 4321\nfail_fast: true\n").unwrap();
    escenario()
        .args(["config", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("scenario_timeout_ms: 4321"))
        .stdout(predicate::str::contains("fail_fast: true"));
}

#[test]
fn test_bad_config_exits_2() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "wait:\n  poll_interval_ms: 0\n").unwrap();
    escenario()
        .args(["run", "--backend", "mock", "-c"])
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_env_base_url_is_used() {
    escenario()
        .args(["config"])
        .env("ESCENARIO_BASE_URL", "https://env.test/")
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url: https://env.test/"));
}
