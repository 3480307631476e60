//! Corruption handling tests for liftlog.
//!
//! These tests verify the system:
//! - Refuses to treat an unreadable store as an empty one
//! - Leaves a damaged store untouched when writes are attempted
//! - Copes with missing directories and stray temp files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("liftlog"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--user")
        .arg("u1");
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_store_is_not_an_empty_list() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("liftlog.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted store");

    cli(data_dir)
        .arg("recent")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Storage unavailable"))
        .stdout(predicate::str::contains("No workouts yet").not());
}

#[test]
fn test_corrupted_store_left_untouched_by_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let store_path = data_dir.join("liftlog.json");

    let garbage = "{\"schema_version\": 1, \"workouts\": [";
    fs::write(&store_path, garbage).unwrap();

    cli(data_dir)
        .args(["start", "--at", "2025-09-01T08:30:00Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Storage unavailable"));

    // The damaged document is kept for inspection rather than replaced
    assert_eq!(fs::read_to_string(&store_path).unwrap(), garbage);
}

#[test]
fn test_empty_store_file_is_corrupt() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("liftlog.json"), "").unwrap();

    cli(data_dir).arg("recent").assert().failure();
}

#[test]
fn test_dangling_reference_is_corrupt() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // A set whose workout exercise does not exist
    let document = r#"{
        "schema_version": 1,
        "exercises": [],
        "workouts": [],
        "workout_exercises": [],
        "sets": [{
            "id": "00000000-0000-0000-0000-000000000001",
            "workout_exercise_id": "00000000-0000-0000-0000-000000000002",
            "set_number": 1,
            "reps": 5,
            "weight": 100.0,
            "rpe": null,
            "reps_in_reserve": null,
            "is_warmup": false,
            "is_drop_set": false,
            "notes": null
        }]
    }"#;
    fs::write(data_dir.join("liftlog.json"), document).unwrap();

    cli(data_dir)
        .arg("recent")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Storage unavailable"));
}

#[test]
fn test_missing_data_directory_is_created() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("nested/data");

    cli(&data_dir)
        .args(["start", "--at", "2025-09-01T08:30:00Z"])
        .assert()
        .success();

    assert!(data_dir.join("liftlog.json").exists());
}

#[test]
fn test_stray_temp_file_ignored() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["start", "--at", "2025-09-01T08:30:00Z"])
        .assert()
        .success();

    // Leftover from a writer that died before renaming
    fs::write(data_dir.join(".tmpAbC123"), "{ half written").unwrap();

    cli(data_dir)
        .arg("recent")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout"));
}
