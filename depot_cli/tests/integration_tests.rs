//! Integration tests for the depot binary.
//!
//! These tests verify end-to-end behavior including:
//! - Recording, editing and deleting doses
//! - Paired placeholder bookkeeping on disk
//! - Estimates and clearance fraction changes
//! - CSV import/export

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI pointed at an isolated data dir and config file
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("depot"));
    cmd.arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--config")
        .arg(dir.join("config.toml"));
    cmd
}

fn read_ledger(dir: &Path) -> serde_json::Value {
    let contents =
        fs::read_to_string(dir.join("data/ledger.json")).expect("Failed to read ledger");
    serde_json::from_str(&contents).expect("Ledger is not valid JSON")
}

fn entries(dir: &Path) -> Vec<serde_json::Value> {
    read_ledger(dir)["entries"]
        .as_array()
        .expect("entries array")
        .clone()
}

fn record(dir: &Path, date: &str, slot: &str, mass: &str) {
    cli(dir)
        .args(["record", "--date", date, "--slot", slot, "--site", "VG-D", "--mass", mass])
        .assert()
        .success();
}

fn real_entry_id(dir: &Path, date: &str, slot: &str) -> String {
    entries(dir)
        .into_iter()
        .find(|e| e["date"] == date && e["slot"] == slot && e["is_synthetic"] == false)
        .expect("entry not found")["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("depot"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Depot injection tracker"));
}

#[test]
fn test_record_creates_paired_placeholder() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["record", "--date", "2024-03-01", "--slot", "morning", "--site", "VG-D", "--mass", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded 100 mg"));

    let entries = entries(dir);
    assert_eq!(entries.len(), 2);

    let placeholder = entries
        .iter()
        .find(|e| e["is_synthetic"] == true)
        .expect("placeholder");
    assert_eq!(placeholder["slot"], "night");
    assert_eq!(placeholder["day_offset"], 0.5);
    assert_eq!(placeholder["dose_mass"], 0.0);
}

#[test]
fn test_negative_mass_rejected() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["record", "--date", "2024-03-01", "--mass", "-5"])
        .assert()
        .failure();

    assert!(!dir.join("data/ledger.json").exists());
}

#[test]
fn test_history_shows_estimate() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    record(dir, "2024-03-01", "morning", "100");

    cli(dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("608.12"))
        .stdout(predicate::str::contains("(auto)"))
        .stdout(predicate::str::contains(" mL "))
        .stdout(predicate::str::contains(" 0.40 "));
}

#[test]
fn test_empty_history() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No doses recorded yet"));
}

#[test]
fn test_delete_removes_pair() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    record(dir, "2024-03-01", "morning", "50");
    record(dir, "2024-03-02", "night", "50");
    assert_eq!(entries(dir).len(), 4);

    let id = real_entry_id(dir, "2024-03-02", "night");
    cli(dir)
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 2 entries"));

    let remaining = entries(dir);
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|e| e["date"] == "2024-03-01"));
}

#[test]
fn test_delete_unknown_id_fails() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    record(dir, "2024-03-01", "morning", "50");

    cli(dir)
        .args(["delete", "00000000-0000-0000-0000-000000000000"])
        .assert()
        .failure();

    assert_eq!(entries(dir).len(), 2);
}

#[test]
fn test_edit_updates_mass() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    record(dir, "2024-03-01", "morning", "50");

    let id = real_entry_id(dir, "2024-03-01", "morning");
    cli(dir)
        .args(["edit", &id, "--mass", "75"])
        .assert()
        .success();

    let entry = entries(dir)
        .into_iter()
        .find(|e| e["id"] == id.as_str())
        .unwrap();
    assert_eq!(entry["dose_mass"], 75.0);
}

#[test]
fn test_estimate_follows_clearance_fraction() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    record(dir, "2024-03-01", "morning", "100");

    // Night placeholder estimate with default clearance (0.15)
    cli(dir)
        .args(["estimate", "--today", "2024-03-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Clearance fraction: 0.150"))
        .stdout(predicate::str::contains("Streak: 1"));

    cli(dir)
        .args(["set-clearance", "0.3"])
        .assert()
        .success();

    let config = fs::read_to_string(dir.join("config.toml")).unwrap();
    assert!(config.contains("clearance_fraction = 0.3"));

    cli(dir)
        .args(["estimate", "--today", "2024-03-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Clearance fraction: 0.300"));
}

#[test]
fn test_invalid_clearance_keeps_previous_value() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir).args(["set-clearance", "0.2"]).assert().success();
    cli(dir).args(["set-clearance", "1.5"]).assert().failure();
    cli(dir).args(["set-clearance", "-0.1"]).assert().failure();

    let config = fs::read_to_string(dir.join("config.toml")).unwrap();
    assert!(config.contains("clearance_fraction = 0.2"));
}

#[test]
fn test_import_then_export() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    let input = dir.join("input.csv");
    fs::write(
        &input,
        "date,time_of_day,site,amount\n\
         2024-03-01,morning,VG-D,20\n\
         2024-03-02,morning,DT-S,20\n\
         2024-03-02,night,DT-S,10\n",
    )
    .unwrap();

    cli(dir)
        .arg("import")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 3 doses"));
    assert_eq!(entries(dir).len(), 4);

    let output = dir.join("export.csv");
    cli(dir)
        .arg("export")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 4 entries"));

    let exported = fs::read_to_string(&output).unwrap();
    let mut lines = exported.lines();
    let header = lines.next().unwrap();
    assert!(header.contains("serum_level"));
    assert!(header.contains("volume_ml"));
    assert_eq!(lines.count(), 4);
}

#[test]
fn test_corrupted_ledger_is_not_overwritten() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    fs::create_dir_all(dir.join("data")).unwrap();
    fs::write(dir.join("data/ledger.json"), "{ invalid json }}}}").unwrap();

    cli(dir)
        .args(["record", "--date", "2024-03-01", "--mass", "10"])
        .assert()
        .failure();

    let contents = fs::read_to_string(dir.join("data/ledger.json")).unwrap();
    assert_eq!(contents, "{ invalid json }}}}");
}
