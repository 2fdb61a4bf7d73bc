//! CLI validation tests for netspeed-tester
//!
//! These exercise argument parsing and validation only; nothing here is
//! allowed to open a network connection.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

/// Helper function to create a test command
fn create_test_cmd() -> Command {
    Command::cargo_bin("nst").unwrap()
}

#[test]
fn test_help_lists_core_flags() {
    create_test_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--time"))
        .stdout(predicate::str::contains("--download-only"))
        .stdout(predicate::str::contains("--upload-only"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--no-live"))
        .stdout(predicate::str::contains("--no-secure"));
}

#[test]
fn test_version_flag() {
    create_test_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nst"));
}

#[test]
fn test_conflicting_only_flags_fail_with_usage_code() {
    create_test_cmd()
        .args(["--download-only", "--upload-only"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cannot specify both"));
}

#[test]
fn test_conflicting_color_flags_fail() {
    create_test_cmd()
        .args(["--color", "--no-color"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--color"));
}

#[test]
fn test_zero_duration_rejected() {
    create_test_cmd()
        .args(["--time", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("at least 1 second"));
}

#[test]
fn test_unknown_flag_rejected_by_parser() {
    create_test_cmd()
        .arg("--definitely-not-a-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--definitely-not-a-flag"));
}

#[test]
fn test_invalid_server_url_fails_before_any_measurement() {
    create_test_cmd()
        .args(["--server-url", "not a url", "--json"])
        .assert()
        .failure()
        .code(1);
}
