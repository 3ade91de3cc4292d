//! Smoke tests -- verify the binary runs and key commands load.

use assert_cmd::Command;

#[test]
fn test_cli_help() {
    Command::cargo_bin("testtriage")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "Decision-ready analytics for test-execution records",
        ));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("testtriage")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("testtriage"));
}

#[test]
fn test_summary_subcommand_exists() {
    Command::cargo_bin("testtriage")
        .unwrap()
        .args(["summary", "--help"])
        .assert()
        .success();
}

#[test]
fn test_trend_subcommand_exists() {
    Command::cargo_bin("testtriage")
        .unwrap()
        .args(["trend", "--help"])
        .assert()
        .success();
}

#[test]
fn test_suite_list_subcommand_exists() {
    Command::cargo_bin("testtriage")
        .unwrap()
        .args(["suite", "list", "--help"])
        .assert()
        .success();
}

#[test]
fn test_ingest_then_summary_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("smoke.db");
    let batch = dir.path().join("batch.json");
    std::fs::write(
        &batch,
        r#"[
            {"test_name": "login", "status": "PASS", "execution_time": 1.5,
             "timestamp": "2025-03-01T08:00:00Z", "suite_name": "smoke"},
            {"test_name": "checkout", "status": "fail", "execution_time": 4.0,
             "timestamp": "2025-03-01T09:00:00Z", "suite_name": "smoke"},
            {"test_name": "search", "status": "PASS", "execution_time": 0.5,
             "timestamp": "2025-03-02T10:00:00Z"}
        ]"#,
    )
    .unwrap();

    Command::cargo_bin("testtriage")
        .unwrap()
        .args(["--db", db.to_str().unwrap(), "ingest"])
        .args(["--file", batch.to_str().unwrap(), "--project", "1"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Ingested 3 record(s)"));

    Command::cargo_bin("testtriage")
        .unwrap()
        .args(["--db", db.to_str().unwrap(), "summary", "--project", "1"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Total tests:    3"))
        .stdout(predicates::str::contains("Pass rate:      66.67%"));
}

#[test]
fn test_malformed_filter_bound_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("smoke.db");

    Command::cargo_bin("testtriage")
        .unwrap()
        .args(["--db", db.to_str().unwrap(), "tests", "--project", "1"])
        .args(["--start-date", "03/02/2025"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("invalid start date"));
}
