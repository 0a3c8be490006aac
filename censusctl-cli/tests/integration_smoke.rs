//! Smoke tests to verify command wiring (no database needed)

use assert_cmd::Command;
use predicates::prelude::*;

fn censusctl() -> Command {
    Command::cargo_bin("censusctl").unwrap()
}

#[test]
fn test_top_level_help_lists_commands() {
    censusctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("next"))
        .stdout(predicate::str::contains("claim"))
        .stdout(predicate::str::contains("clear-results"));
}

// === Scheduler Commands ===

#[test]
fn test_next_help() {
    censusctl()
        .arg("next")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("no reservation"));
}

#[test]
fn test_claim_help() {
    censusctl()
        .arg("claim")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("one transaction"));
}

// === Status Commands ===

#[test]
fn test_set_status_help() {
    censusctl()
        .arg("set-status")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("name or numeric code"));
}

#[test]
fn test_set_status_rejects_bad_status_before_connecting() {
    censusctl()
        .args(["set-status", "com.example.app", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bogus"));
}

#[test]
fn test_mark_tested_help() {
    censusctl()
        .arg("mark-tested")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Clear the tested flag"));
}

// === Lookup Commands ===

#[test]
fn test_app_id_help() {
    censusctl()
        .arg("app-id")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Package name to resolve"));
}

#[test]
fn test_release_id_help() {
    censusctl()
        .arg("release-id")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("version code"));
}

// === Maintenance Commands ===

#[test]
fn test_clear_results_help() {
    censusctl()
        .arg("clear-results")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Only delete permission results"));
}

#[test]
fn test_check_time_help() {
    censusctl()
        .arg("check-time")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Epoch seconds"));
}

#[test]
fn test_log_values_flag_is_validated() {
    censusctl()
        .args(["--log-values", "verbose", "next"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("verbose"));
}
