//! Integration tests for the flowtimer binary.
//!
//! These tests verify end-to-end behavior including:
//! - Library seeding and listing
//! - Importing and validating workout files
//! - Running a workout countdown to completion

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the CLI binary, isolated from the user's config
fn cli(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("flowtimer"));
    cmd.env("XDG_CONFIG_HOME", temp_dir.path().join("config"))
        .arg("--data-dir")
        .arg(temp_dir.path());
    cmd
}

/// Two one-second timers repeated twice
fn write_tiny_workout(path: &Path) {
    let workout = serde_json::json!({
        "id": "tiny",
        "name": "Tiny",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "sections": [{
            "id": "tiny.main",
            "name": "Main",
            "repeat_count": 2,
            "timers": [
                { "id": "tiny.main.0", "name": "Reach", "duration_seconds": 1 },
                { "id": "tiny.main.1", "name": "Fold", "duration_seconds": 1 }
            ]
        }]
    });
    fs::write(path, serde_json::to_string_pretty(&workout).unwrap()).unwrap();
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("flowtimer"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Interval timer for nested, repeating workouts",
        ));
}

#[test]
fn test_list_seeds_default_catalog() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Beginner Yoga Flow"))
        .stdout(predicate::str::contains("Advanced Vinyasa"))
        .stdout(predicate::str::contains("29 steps"));

    assert!(temp_dir.path().join("workouts/advanced_vinyasa.json").exists());
    assert!(temp_dir.path().join("workouts/beginner_yoga_flow.json").exists());
}

#[test]
fn test_show_prints_tree_and_steps() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["show", "advanced_vinyasa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warrior Flow x2"))
        .stdout(predicate::str::contains("Warrior Flow 2/2 > Left Side"))
        .stdout(predicate::str::contains("29. Savasana"));
}

#[test]
fn test_show_unknown_workout_fails() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["show", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
}

#[test]
fn test_import_valid_workout() {
    let temp_dir = setup_test_dir();
    let file = temp_dir.path().join("tiny.json");
    write_tiny_workout(&file);

    cli(&temp_dir)
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 'Tiny'"))
        .stdout(predicate::str::contains("4 steps"));

    cli(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tiny"));
}

#[test]
fn test_import_rejects_invalid_workout() {
    let temp_dir = setup_test_dir();
    let file = temp_dir.path().join("bad.json");
    let workout = serde_json::json!({
        "id": "bad",
        "name": "Bad",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "sections": [{
            "id": "bad.main",
            "name": "Main",
            "repeat_count": 100,
            "timers": [{ "id": "bad.main.0", "name": "Hold", "duration_seconds": 30 }]
        }]
    });
    fs::write(&file, workout.to_string()).unwrap();

    cli(&temp_dir)
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("repeat count 100"));

    assert!(!temp_dir.path().join("workouts/bad.json").exists());
}

#[test]
fn test_import_rejects_id_with_spaces() {
    let temp_dir = setup_test_dir();
    let file = temp_dir.path().join("spaced.json");
    let workout = serde_json::json!({
        "id": "my workout",
        "name": "Spaced",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "sections": [{
            "id": "spaced.main",
            "name": "Main",
            "timers": [{ "id": "spaced.main.0", "name": "Hold", "duration_seconds": 30 }]
        }]
    });
    fs::write(&file, workout.to_string()).unwrap();

    cli(&temp_dir)
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("'my workout' contains invalid characters"));
}

#[test]
fn test_import_rejects_workout_without_timers() {
    let temp_dir = setup_test_dir();
    let file = temp_dir.path().join("hollow.json");
    let workout = serde_json::json!({
        "id": "hollow",
        "name": "Hollow",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "sections": [{ "id": "hollow.main", "name": "Main" }]
    });
    fs::write(&file, workout.to_string()).unwrap();

    cli(&temp_dir)
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one timer"));
}

#[test]
fn test_import_rejects_malformed_json() {
    let temp_dir = setup_test_dir();
    let file = temp_dir.path().join("broken.json");
    fs::write(&file, "{ invalid json }").unwrap();

    cli(&temp_dir).arg("import").arg(&file).assert().failure();
}

#[test]
fn test_run_completes_workout() {
    let temp_dir = setup_test_dir();
    let file = temp_dir.path().join("tiny.json");
    write_tiny_workout(&file);
    cli(&temp_dir).arg("import").arg(&file).assert().success();

    cli(&temp_dir)
        .args(["run", "tiny", "--tick-ms", "1"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("== Main, repeat 1 of 2 =="))
        .stdout(predicate::str::contains("== Main, repeat 2 of 2 =="))
        .stdout(predicate::str::contains("✓ Fold"))
        .stdout(predicate::str::contains("Workout complete!"));
}

#[test]
fn test_run_stops_on_quit() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["run", "beginner_yoga_flow"])
        .write_stdin("q\n")
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopped after"))
        .stdout(predicate::str::contains("Workout complete!").not());
}

#[test]
fn test_run_rejects_zero_tick() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["run", "beginner_yoga_flow", "--tick-ms", "0"])
        .assert()
        .failure();
}

#[test]
fn test_delete_workout() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["delete", "beginner_yoga_flow"])
        .assert()
        .success();

    cli(&temp_dir)
        .args(["delete", "beginner_yoga_flow"])
        .assert()
        .failure();
}
