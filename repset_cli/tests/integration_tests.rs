//! Integration tests for the repset binary.
//!
//! These tests drive the CLI end to end:
//! - Building workouts by hand and from generated text
//! - Running sessions interactively and in auto modes
//! - History listing and CSV export
//! - Preferences

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("repset"))
}

fn repset(data_dir: &Path) -> Command {
    let mut cmd = cli();
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn create_push_workout(data_dir: &Path) {
    repset(data_dir)
        .args(["workout", "create", "Push"])
        .args(["-e", "Bench Press:8:2"])
        .args(["-e", "Dips:10:2:bw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created workout 'Push'"));
}

fn history_lines(data_dir: &Path) -> Vec<serde_json::Value> {
    let path = data_dir.join("history.jsonl");
    if !path.exists() {
        return Vec::new();
    }
    fs::read_to_string(path)
        .expect("Failed to read history")
        .lines()
        .map(|line| serde_json::from_str(line).expect("history line is JSON"))
        .collect()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Strength workout builder and session tracker",
        ));
}

#[test]
fn test_workout_create_list_show_delete() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    repset(data_dir)
        .args(["workout", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts saved yet"));

    create_push_workout(data_dir);

    repset(data_dir)
        .args(["workout", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Push  (2 exercises)"));

    repset(data_dir)
        .args(["workout", "show", "push"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Bench Press - 8 reps, 2 sets"))
        .stdout(predicate::str::contains("2. Dips - 10 reps, 2 sets [bodyweight]"));

    repset(data_dir)
        .args(["workout", "delete", "Push"])
        .assert()
        .success();

    repset(data_dir)
        .args(["workout", "show", "Push"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_workout_create_rejects_bad_exercise_arg() {
    let temp_dir = setup_test_dir();

    repset(temp_dir.path())
        .args(["workout", "create", "Broken", "-e", "Row:ten:3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("name:reps:sets"));

    assert!(!temp_dir.path().join("workouts.json").exists());
}

#[test]
fn test_auto_complete_session_logs_history() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    create_push_workout(data_dir);

    repset(data_dir)
        .args(["start", "Push", "--auto-complete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exercise 1 of 2 (50%)"))
        .stdout(predicate::str::contains("Exercise 2 of 2 (100%)"))
        .stdout(predicate::str::contains("Workout complete: Push"));

    let history = history_lines(data_dir);
    assert_eq!(history.len(), 1);

    let record = &history[0];
    assert_eq!(record["workout_name"], "Push");
    let exercises = record["exercises"].as_array().unwrap();
    assert_eq!(exercises.len(), 2);

    // Unset weight on a completed weighted set is recorded as zero load
    let bench_sets = exercises[0]["sets"].as_array().unwrap();
    assert_eq!(bench_sets.len(), 2);
    assert_eq!(bench_sets[0]["completed"], true);
    assert_eq!(bench_sets[0]["reps"], 8);
    assert_eq!(bench_sets[0]["weight"].as_f64(), Some(0.0));

    let dip_sets = exercises[1]["sets"].as_array().unwrap();
    assert_eq!(dip_sets[0]["weight"], "bodyweight");
}

#[test]
fn test_auto_skip_records_empty_exercises() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    create_push_workout(data_dir);

    repset(data_dir)
        .args(["start", "Push", "--auto-skip"])
        .assert()
        .success();

    let history = history_lines(data_dir);
    assert_eq!(history.len(), 1);
    for exercise in history[0]["exercises"].as_array().unwrap() {
        assert!(exercise["sets"].as_array().unwrap().is_empty());
    }
}

#[test]
fn test_interactive_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    create_push_workout(data_dir);

    // Complete and load set 1 of bench, leave set 2, then skip dips
    repset(data_dir)
        .args(["start", "Push"])
        .write_stdin("1\nw 1 60\nr 1 6\nf\ns\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] Set 1: 6 reps @ 60"))
        .stdout(predicate::str::contains("Workout complete: Push"));

    let history = history_lines(data_dir);
    assert_eq!(history.len(), 1);

    let exercises = history[0]["exercises"].as_array().unwrap();
    let bench_sets = exercises[0]["sets"].as_array().unwrap();
    assert_eq!(bench_sets[0]["reps"], 6);
    assert_eq!(bench_sets[0]["weight"].as_f64(), Some(60.0));
    assert_eq!(bench_sets[0]["completed"], true);

    // Incomplete sets collapse to zero
    assert_eq!(bench_sets[1]["reps"], 0);
    assert_eq!(bench_sets[1]["weight"].as_f64(), Some(0.0));
    assert_eq!(bench_sets[1]["completed"], false);

    assert!(exercises[1]["sets"].as_array().unwrap().is_empty());
}

#[test]
fn test_interactive_bad_set_number_keeps_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    create_push_workout(data_dir);

    repset(data_dir)
        .args(["start", "Push"])
        .write_stdin("9\nbogus\nf\nf\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("out of range"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Workout complete"));

    assert_eq!(history_lines(data_dir).len(), 1);
}

#[test]
fn test_quit_and_eof_abandon_without_history() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    create_push_workout(data_dir);

    repset(data_dir)
        .args(["start", "Push"])
        .write_stdin("1\nf\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session abandoned"));

    repset(data_dir)
        .args(["start", "Push"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session abandoned"));

    assert!(history_lines(data_dir).is_empty());
}

#[test]
fn test_start_unknown_workout_fails() {
    let temp_dir = setup_test_dir();

    repset(temp_dir.path())
        .args(["start", "Nope", "--auto-complete"])
        .assert()
        .failure();
}

#[test]
fn test_suggest_from_stdin_and_save() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let generated = "1. Push-ups - 15 reps, 3 sets\n\n2. Barbell Row - 10 reps\n3. Plank - 30-45 seconds\n";

    repset(data_dir)
        .args(["suggest", "--save-as", "Generated"])
        .write_stdin(generated)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1. Push ups - 15 reps, 3 sets [bodyweight]",
        ))
        .stdout(predicate::str::contains("2. Barbell Row - 10 reps, 3 sets"))
        .stdout(predicate::str::contains("3. Plank - 30 reps, 3 sets [bodyweight]"))
        .stdout(predicate::str::contains("Saved workout 'Generated'"));

    repset(data_dir)
        .args(["workout", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated  (3 exercises)"));
}

#[test]
fn test_suggest_uses_preference_defaults() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    repset(data_dir)
        .args(["prefs", "defaults", "--reps", "5", "--sets", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Defaults: 5 reps, 4 sets"));

    let file = data_dir.join("generated.txt");
    fs::write(&file, "Deadlift\n").unwrap();

    repset(data_dir)
        .arg("suggest")
        .arg("--file")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Deadlift - 5 reps, 4 sets"));
}

#[test]
fn test_suggest_nothing_usable() {
    let temp_dir = setup_test_dir();

    repset(temp_dir.path())
        .args(["suggest", "--save-as", "Empty"])
        .write_stdin("- 12 reps\n::::\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No usable exercises found"));

    assert!(!temp_dir.path().join("workouts.json").exists());
}

#[test]
fn test_suggest_blank_input_is_malformed_response() {
    let temp_dir = setup_test_dir();

    repset(temp_dir.path())
        .arg("suggest")
        .write_stdin("   \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_prompt_uses_owned_equipment() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    repset(data_dir)
        .args(["prompt", "quick upper body"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"quick upper body\""))
        .stdout(predicate::str::contains("following equipment").not());

    repset(data_dir)
        .args(["prefs", "equipment", "add", "Dumbbells"])
        .assert()
        .success();
    repset(data_dir)
        .args(["prefs", "equipment", "add", "Bench"])
        .assert()
        .success();

    repset(data_dir)
        .args(["prompt", "quick upper body"])
        .assert()
        .success()
        .stdout(predicate::str::contains("following equipment: Dumbbells, Bench."));

    repset(data_dir)
        .args(["prompt", "legs", "-e", "Kettlebell"])
        .assert()
        .success()
        .stdout(predicate::str::contains("following equipment: Kettlebell."));
}

#[test]
fn test_history_list_and_export() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    repset(data_dir)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workout history yet"));

    create_push_workout(data_dir);
    for _ in 0..3 {
        repset(data_dir)
            .args(["start", "Push", "--auto-complete"])
            .assert()
            .success();
    }

    let output = repset(data_dir)
        .args(["history", "list", "--limit", "2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let listed = String::from_utf8(output).unwrap();
    assert_eq!(listed.lines().filter(|l| l.contains("Push")).count(), 2);
    assert!(listed.contains("4 sets done"));

    let csv_path = data_dir.join("export").join("history.csv");
    repset(data_dir)
        .args(["history", "export"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 12 rows from 3 sessions"));

    let content = fs::read_to_string(&csv_path).unwrap();
    assert!(content.starts_with("history_id,workout_name"));
    assert_eq!(content.lines().count(), 13);

    // Exporting again replaces the file instead of appending to it
    repset(data_dir)
        .args(["history", "export"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 12 rows from 3 sessions"));

    let content = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(content.lines().count(), 13);
    assert_eq!(content.matches("history_id").count(), 1);
}

#[test]
fn test_prefs_workflow() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    repset(data_dir)
        .args(["prefs", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dark mode: off"))
        .stdout(predicate::str::contains("Default reps: 8"))
        .stdout(predicate::str::contains("Default sets: 3"))
        .stdout(predicate::str::contains("Equipment: none"));

    repset(data_dir)
        .args(["prefs", "dark-mode"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dark mode on"));

    repset(data_dir)
        .args(["prefs", "defaults", "--reps", "0"])
        .assert()
        .failure();

    repset(data_dir)
        .args(["prefs", "equipment", "add", "Bench"])
        .assert()
        .success();
    repset(data_dir)
        .args(["prefs", "equipment", "add", " Bench "])
        .assert()
        .success()
        .stdout(predicate::str::contains("already listed"));
    repset(data_dir)
        .args(["prefs", "equipment", "remove", "Barbell"])
        .assert()
        .failure();

    repset(data_dir)
        .args(["prefs", "pr", "add", "Deadlift", "180", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded Deadlift - 180 x 1"));

    repset(data_dir)
        .args(["prefs", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dark mode: on"))
        .stdout(predicate::str::contains("Equipment: Bench"))
        .stdout(predicate::str::contains("Deadlift - 180 x 1"));

    let prefs: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_dir.join("preferences.json")).unwrap())
            .unwrap();
    let id = prefs["personal_records"][0]["id"].as_str().unwrap().to_string();

    repset(data_dir)
        .args(["prefs", "pr", "remove", &id[..8]])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed personal record for Deadlift"));
}

#[test]
fn test_history_write_failure_keeps_session_open() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    create_push_workout(data_dir);

    // A directory where the history file should be makes every append fail
    fs::create_dir(data_dir.join("history.jsonl")).unwrap();

    let output = repset(data_dir)
        .args(["start", "Push"])
        .write_stdin("f\n1\nf\ns\nq\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Could not save workout history"))
        .stdout(predicate::str::contains("The session is still open"))
        .stdout(predicate::str::contains("Session abandoned"))
        .get_output()
        .stdout
        .clone();

    // Still on the last exercise after each failed attempt, with its set ticked
    let stdout = String::from_utf8(output).unwrap();
    assert_eq!(stdout.matches("Exercise 2 of 2 (100%)").count(), 4);
    assert!(stdout.contains("[x] Set 1: 10 reps @ bodyweight"));
    assert!(!stdout.contains("Workout complete"));
}

#[test]
fn test_history_write_failure_in_auto_mode_fails() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    create_push_workout(data_dir);
    fs::create_dir(data_dir.join("history.jsonl")).unwrap();

    repset(data_dir)
        .args(["start", "Push", "--auto-complete"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: IO error"));
}

#[test]
fn test_first_interactive_session_shows_tips_once() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    create_push_workout(data_dir);

    repset(data_dir)
        .args(["start", "Push"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tip:"));

    repset(data_dir)
        .args(["start", "Push"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tip:").not());

    let prefs: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_dir.join("preferences.json")).unwrap())
            .unwrap();
    assert!(prefs["last_splash_shown"].is_string());
}

#[test]
fn test_workout_edit() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    create_push_workout(data_dir);

    repset(data_dir)
        .args(["workout", "edit", "Push", "--name", "Push Day"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated workout 'Push Day' (2 exercises)"));

    repset(data_dir)
        .args(["workout", "edit", "push day", "-e", "Overhead Press:6:4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated workout 'Push Day' (1 exercises)"));

    repset(data_dir)
        .args(["workout", "show", "Push Day"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Overhead Press - 6 reps, 4 sets"))
        .stdout(predicate::str::contains("Bench Press").not());

    repset(data_dir)
        .args(["workout", "edit", "Push Day", "--name", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be empty"));
}

#[test]
fn test_prefs_pr_edit() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    repset(data_dir)
        .args(["prefs", "pr", "add", "Squat", "140", "3"])
        .assert()
        .success();

    let prefs: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_dir.join("preferences.json")).unwrap())
            .unwrap();
    let id = prefs["personal_records"][0]["id"].as_str().unwrap().to_string();

    repset(data_dir)
        .args(["prefs", "pr", "edit", &id[..8], "--weight", "145", "--reps", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated Squat - 145 x 2"));

    repset(data_dir)
        .args(["prefs", "pr", "edit", &id[..8], "--weight", "-1"])
        .assert()
        .failure();

    repset(data_dir)
        .args(["prefs", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat - 145 x 2"));
}

#[test]
fn test_prompt_reports_generation_settings() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let config_path = data_dir.join("config.toml");
    fs::write(
        &config_path,
        "[generation]\nmodel = \"test-model\"\ntimeout_seconds = 12\napi_key_env = \"REPSET_CLI_TEST_KEY\"\n",
    )
    .unwrap();

    repset(data_dir)
        .arg("--config")
        .arg(&config_path)
        .args(["prompt", "legs"])
        .env("REPSET_CLI_TEST_KEY", "secret")
        .assert()
        .success()
        .stdout(predicate::str::contains("Model: test-model (timeout 12s)"))
        .stdout(predicate::str::contains("API key: $REPSET_CLI_TEST_KEY (set)"))
        .stdout(predicate::str::contains("secret").not());

    repset(data_dir)
        .arg("--config")
        .arg(&config_path)
        .args(["prompt", "legs"])
        .env_remove("REPSET_CLI_TEST_KEY")
        .assert()
        .success()
        .stdout(predicate::str::contains("(not set)"));
}

#[test]
fn test_config_file_supplies_data_dir() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("from-config");

    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!("[data]\ndata_dir = {:?}\n", data_dir.display().to_string()),
    )
    .unwrap();

    cli()
        .arg("--config")
        .arg(&config_path)
        .args(["workout", "create", "Legs", "-e", "Squat:5:5"])
        .assert()
        .success();

    assert!(data_dir.join("workouts.json").exists());
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[generation]\ntimeout_seconds = 0\n").unwrap();

    repset(temp_dir.path())
        .arg("--config")
        .arg(&config_path)
        .args(["workout", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
