//! Integration tests for the newton binary.
//!
//! These tests verify end-to-end behavior including:
//! - Building routines from the command line
//! - Backup export and import
//! - Analytics logs and CSV export
//! - The interactive workout session

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI pointed at an isolated data directory and config file
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("newton"));
    cmd.arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--config")
        .arg(dir.join("config.toml"));
    cmd
}

fn run(dir: &Path, args: &[&str]) {
    cli(dir).args(args).assert().success();
}

/// Push Day: bench 2 sets (rest 90s), overhead press 1 set (rest 60s)
fn push_day(dir: &Path) {
    run(dir, &["routine", "add", "Push Day"]);
    run(
        dir,
        &["exercise", "add", "Push Day", "Bench Press", "--category", "Chest", "--rest", "90"],
    );
    run(
        dir,
        &["exercise", "add", "Push Day", "Overhead Press", "--category", "Shoulders", "--rest", "60"],
    );
    run(dir, &["set", "add", "Push Day", "1", "135", "5"]);
    run(dir, &["set", "add", "Push Day", "1", "135", "5"]);
    run(dir, &["set", "add", "Push Day", "2", "95", "8"]);
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout routines"));
}

#[test]
fn test_build_and_show_routine() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    push_day(dir);

    cli(dir)
        .args(["routine", "show", "Push Day"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Bench Press [Chest] rest 90s"))
        .stdout(predicate::str::contains("2) 135lbs x 5"))
        .stdout(predicate::str::contains("2. Overhead Press [Shoulders] rest 60s"));

    assert!(dir.join("data/store.json").exists());
}

#[test]
fn test_routine_lookup_by_position() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    run(dir, &["routine", "add", "Legs"]);
    run(dir, &["routine", "add", "Pull"]);
    run(dir, &["routine", "move", "2", "1"]);

    cli(dir)
        .args(["routine", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Pull"))
        .stdout(predicate::str::contains("2. Legs"));

    run(dir, &["routine", "rename", "2", "Leg Day"]);
    cli(dir)
        .args(["routine", "show", "Leg Day"])
        .assert()
        .success();
}

#[test]
fn test_unknown_routine_fails() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["routine", "show", "Nope"])
        .assert()
        .failure();
}

#[test]
fn test_template_in_use_cannot_be_deleted() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    push_day(dir);

    cli(dir)
        .args(["template", "delete", "Bench Press"])
        .assert()
        .failure();

    run(dir, &["exercise", "remove", "Push Day", "1"]);
    run(dir, &["template", "delete", "Bench Press"]);

    cli(dir)
        .args(["template", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bench Press").not());
}

#[test]
fn test_seed_templates() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["template", "seed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("built-in templates"));

    // Seeding twice adds nothing
    cli(dir)
        .args(["template", "seed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 0 built-in templates"));
}

#[test]
fn test_export_then_import_into_fresh_data_dir() {
    let source = setup_test_dir();
    push_day(source.path());
    run(
        source.path(),
        &["log", "add", "Bodyweight", "180.5", "--unit", "lbs", "--at", "2024-11-07T08:00:00Z"],
    );

    let backups = source.path().join("backups");
    cli(source.path())
        .arg("export")
        .arg("--dir")
        .arg(&backups)
        .assert()
        .success()
        .stdout(predicate::str::contains("fitness_data_"));

    let file = fs::read_dir(&backups)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| p.extension().is_some_and(|ext| ext == "json"))
        .expect("backup file");

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(doc["routines"][0]["name"], "Push Day");
    assert_eq!(doc["exerciseTemplates"].as_array().unwrap().len(), 2);
    assert_eq!(doc["analyticsLogs"][0]["name"], "Bodyweight");

    let target = setup_test_dir();
    cli(target.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1 routines, 2 exercise templates, 1 log entries added",
        ));

    cli(target.path())
        .args(["routine", "show", "Push Day"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1) 95lbs x 8"));

    // A second import only skips
    cli(target.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0 routines, 0 exercise templates, 0 log entries added",
        ));
}

#[test]
fn test_import_malformed_file_fails_without_changes() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    push_day(dir);
    let before = fs::read_to_string(dir.join("data/store.json")).unwrap();

    let bad = dir.join("bad.json");
    fs::write(&bad, "{ \"routines\": [").unwrap();

    cli(dir)
        .arg("import")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid backup"));

    let after = fs::read_to_string(dir.join("data/store.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_delete_all_requires_confirmation() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    push_day(dir);

    cli(dir)
        .arg("delete-all")
        .write_stdin("no\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted"));

    cli(dir)
        .args(["routine", "list"])
        .assert()
        .stdout(predicate::str::contains("Push Day"));

    run(dir, &["delete-all", "--yes"]);

    cli(dir)
        .args(["routine", "list"])
        .assert()
        .stdout(predicate::str::contains("No routines yet."));
}

#[test]
fn test_log_summary_and_csv() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    run(dir, &["log", "add", "Water", "1.5", "--unit", "L", "--cumulative", "--goal", "3"]);
    run(dir, &["log", "add", "Water", "2", "--unit", "L", "--cumulative", "--goal", "3"]);

    cli(dir)
        .args(["log", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Water: latest 2.0 L (↑0.5)"))
        .stdout(predicate::str::contains("today: 3.5 of 3.0"));

    let csv_path = dir.join("analytics.csv");
    cli(dir)
        .args(["log", "export"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 entries"));

    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("name,value,unit,timestamp,cumulative,daily_goal"));
}

#[test]
fn test_plate_calculator() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["plates", "225"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2x 45lbs"));

    cli(temp_dir.path())
        .args(["plates", "46"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not achievable"));
}

#[test]
fn test_config_set_weight_unit() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    run(dir, &["config", "set", "units.weight", "kg"]);
    assert!(dir.join("config.toml").exists());

    cli(dir)
        .args(["plates", "60"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1x 20kg"));

    cli(dir)
        .args(["config", "set", "units.weight", "stone"])
        .assert()
        .failure();
}

#[test]
fn test_workout_rest_and_skip() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    push_day(dir);

    cli(dir)
        .args(["workout", "Push Day"])
        .write_stdin("done 1 1\nstatus\nskip\nskip\nend\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Started Push Day"))
        .stdout(predicate::str::contains("Rest 1:30 (Bench Press"))
        .stdout(predicate::str::contains("[x] 1) 135lbs x 5"))
        .stdout(predicate::str::contains("Rest skipped"))
        .stdout(predicate::str::contains("No rest running"))
        .stdout(predicate::str::contains("Workout ended."));
}

#[test]
fn test_workout_final_set_starts_no_rest() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    push_day(dir);

    cli(dir)
        .args(["workout", "1"])
        .write_stdin("done 2 1\nskip\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Set 1 of exercise 2 done"))
        .stdout(predicate::str::contains("No rest running"))
        .stdout(predicate::str::contains("Workout ended."));
}
