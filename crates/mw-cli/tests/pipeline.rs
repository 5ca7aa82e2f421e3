//! End-to-end tests for the offline pipeline.
//!
//! Tests the flow: load manifest → populate schedule from a saved feed →
//! report upcoming activities, driving the `mw` binary against a temp cache.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rusqlite::Connection;
use tempfile::TempDir;

fn mw_binary() -> String {
    env!("CARGO_BIN_EXE_mw").to_string()
}

/// Runs `mw` with its config, data and cache isolated under `temp`.
fn mw(temp: &Path, args: &[&str]) -> Output {
    Command::new(mw_binary())
        .env("HOME", temp)
        .env("XDG_CONFIG_HOME", temp.join("config"))
        .env("XDG_DATA_HOME", temp.join("data"))
        .env("MW_DATABASE_PATH", temp.join("cache.db"))
        .env_remove("MW_API_KEY")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run mw")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "mw should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

/// Writes a minimal manifest database with the three definition tables.
fn write_manifest(temp: &Path) -> PathBuf {
    let path = temp.join("world.content");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE DestinyDestinationDefinition (id INTEGER PRIMARY KEY, json BLOB);
        CREATE TABLE DestinyActivityModifierDefinition (id INTEGER PRIMARY KEY, json BLOB);
        CREATE TABLE DestinyActivityDefinition (id INTEGER PRIMARY KEY, json BLOB);

        INSERT INTO DestinyDestinationDefinition VALUES
            (1, '{"hash": 9, "displayProperties": {"name": "Moon"}}');
        INSERT INTO DestinyActivityModifierDefinition VALUES
            (2, '{"hash": 8, "displayProperties": {"name": "Grandmaster Modifiers"}}'),
            (3, '{"hash": 6, "displayProperties": {"name": "Master Modifiers"}}');
        INSERT INTO DestinyActivityDefinition VALUES
            (4, '{"hash": 100, "displayProperties": {"name": "Vault"}, "destinationHash": 9,
                  "modifiers": [{"activityModifierHash": 7}, {"activityModifierHash": 8}]}'),
            (5, '{"hash": 300, "displayProperties": {"name": "Patrol"}, "destinationHash": 9}'),
            (6, '{}');
        "#,
    )
    .unwrap();
    path
}

fn write_feed(temp: &Path, name: &str, json: &str) -> PathBuf {
    let path = temp.join(name);
    std::fs::write(&path, json).unwrap();
    path
}

const FEED: &str = r#"{
    "Response": {
        "5": {
            "milestoneHash": 5,
            "startDate": "2026-10-19T17:00:00Z",
            "endDate": "2026-10-21T17:00:00Z",
            "activities": [
                {"activityHash": 100, "modifierHashes": [1, 2]},
                {"activityHash": 300, "modifierHashes": []}
            ]
        }
    },
    "ErrorCode": 1,
    "ErrorStatus": "Success"
}"#;

#[test]
fn test_full_offline_pipeline_reports_grandmaster_vault() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(temp.path());
    let feed = write_feed(temp.path(), "milestones.json", FEED);

    let loaded = stdout(&mw(
        temp.path(),
        &["load-manifest", manifest.to_str().unwrap()],
    ));
    assert_eq!(
        loaded,
        "Catalog populated: 2 activities (1 blank rows skipped)\n"
    );

    let report = stdout(&mw(
        temp.path(),
        &[
            "upcoming",
            "--feed",
            feed.to_str().unwrap(),
            "--now",
            "2026-10-19T12:00:00",
        ],
    ));
    assert!(report.contains("Grandmaster: Vault"), "report: {report}");
    assert!(report.contains("Destination: Moon"));
    assert!(!report.contains("Patrol"));
}

#[test]
fn test_load_manifest_twice_keeps_row_count() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(temp.path());

    stdout(&mw(temp.path(), &["load-manifest", manifest.to_str().unwrap()]));
    let second = stdout(&mw(
        temp.path(),
        &["load-manifest", manifest.to_str().unwrap()],
    ));
    assert_eq!(second, "Catalog already populated.\n");

    let status = stdout(&mw(temp.path(), &["status"]));
    assert!(status.contains("(2 activities)"), "status: {status}");
}

#[test]
fn test_second_feed_is_ignored_until_reset() {
    let temp = TempDir::new().unwrap();
    let manifest = write_manifest(temp.path());
    let feed = write_feed(temp.path(), "milestones.json", FEED);
    let other = write_feed(
        temp.path(),
        "other.json",
        r#"{"6": {"startDate": "2026-10-19T17:00:00Z", "endDate": "2026-10-21T17:00:00Z",
                  "activities": [
                      {"activityHash": 100, "modifierHashes": [8]},
                      {"activityHash": 300, "modifierHashes": []},
                      {"activityHash": 301, "modifierHashes": []}
                  ]}}"#,
    );
    let now = "2026-10-19T12:00:00";

    stdout(&mw(temp.path(), &["load-manifest", manifest.to_str().unwrap()]));
    stdout(&mw(
        temp.path(),
        &["upcoming", "--feed", feed.to_str().unwrap(), "--now", now],
    ));

    // The schedule is already populated, so event 6 never lands in the cache.
    let report = stdout(&mw(
        temp.path(),
        &["upcoming", "--feed", other.to_str().unwrap(), "--now", now],
    ));
    assert_eq!(report, "No upcoming activities found.\n");
    let status = stdout(&mw(temp.path(), &["status"]));
    assert!(status.contains("(2 occurrences)"), "status: {status}");

    stdout(&mw(temp.path(), &["reset"]));
    stdout(&mw(temp.path(), &["load-manifest", manifest.to_str().unwrap()]));
    let report = stdout(&mw(
        temp.path(),
        &["upcoming", "--feed", other.to_str().unwrap(), "--now", now],
    ));
    assert!(report.contains("Grandmaster: Vault"), "report: {report}");
    let status = stdout(&mw(temp.path(), &["status"]));
    assert!(status.contains("(3 occurrences)"), "status: {status}");
}

#[test]
fn test_run_without_api_key_fails() {
    let temp = TempDir::new().unwrap();
    let output = mw(temp.path(), &["run", "--dry-run"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing API key"));
}

#[test]
fn test_load_manifest_rejects_non_manifest_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bogus.content");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE Unrelated (id INTEGER);")
        .unwrap();

    let output = mw(temp.path(), &["load-manifest", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to open manifest"));
}
