//! Concurrency tests for liftlog.
//!
//! These tests verify that multiple processes can safely:
//! - Create workouts against the same store at once
//! - Read while another process writes
//! - Update the same workout without losing the document

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;
use std::thread;
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

fn recent(data_dir: &Path) -> Vec<Value> {
    let output = cli(data_dir)
        .arg("recent")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&output).expect("stdout should be JSON");
    parsed.as_array().cloned().unwrap_or_default()
}

#[test]
fn test_concurrent_workout_creation() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let dir = data_dir.clone();
            thread::spawn(move || {
                cli(&dir)
                    .arg("start")
                    .arg("--at")
                    .arg(format!("2025-09-01T0{}:00:00Z", i))
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // Every create must have landed; none may overwrite another
    let workouts = recent(&data_dir);
    assert_eq!(workouts.len(), 5, "Expected 5 workouts, got {}", workouts.len());
}

#[test]
fn test_concurrent_reads_and_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli(&data_dir)
        .args(["start", "--at", "2025-09-01T06:00:00Z"])
        .assert()
        .success();

    let writers: Vec<_> = (0..3)
        .map(|i| {
            let dir = data_dir.clone();
            thread::spawn(move || {
                cli(&dir)
                    .arg("start")
                    .arg("--at")
                    .arg(format!("2025-09-02T0{}:00:00Z", i))
                    .assert()
                    .success();
            })
        })
        .collect();

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let dir = data_dir.clone();
            thread::spawn(move || {
                // A reader sees some committed snapshot, never a partial file
                let seen = recent(&dir).len();
                assert!((1..=4).contains(&seen), "Reader saw {} workouts", seen);
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(recent(&data_dir).len(), 4);
}

#[test]
fn test_concurrent_updates_to_one_workout() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    let output = cli(&data_dir)
        .args(["start", "--at", "2025-09-01T06:00:00Z", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let created: Value = serde_json::from_slice(&output).unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let dir = data_dir.clone();
            let id = id.clone();
            thread::spawn(move || {
                cli(&dir)
                    .arg("update")
                    .arg(&id)
                    .arg("--notes")
                    .arg(format!("writer {}", i))
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let workouts = recent(&data_dir);
    assert_eq!(workouts.len(), 1);
    let notes = workouts[0]["notes"].as_str().unwrap();
    assert!(notes.starts_with("writer "), "Unexpected notes {:?}", notes);
    assert_eq!(workouts[0]["started_at"], "2025-09-01T06:00:00Z");
}
