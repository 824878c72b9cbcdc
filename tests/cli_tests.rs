use predicates::prelude::*;

use test_env::{flowsim_cmd, setup_test_env};

const RC: &str = "color=never\n";

// =============================================================================
// Static views
// =============================================================================

#[test]
fn test_stages_lists_the_flow() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["stages"])
        .assert()
        .success()
        .stdout(predicate::str::contains("apiGateway"))
        .stdout(predicate::str::contains("SNS Notification"))
        .stdout(predicate::str::contains("Message published to SQS"));
}

#[test]
fn test_stages_json() {
    let (temp_dir, _guard) = setup_test_env(RC);
    let output = flowsim_cmd(&temp_dir).args(["stages", "--json"]).output().unwrap();
    assert!(output.status.success());
    let stages: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let stages = stages.as_array().unwrap();
    assert_eq!(stages.len(), 7);
    assert_eq!(stages[3]["id"], "sqs");
    assert_eq!(stages[3]["ordinal"], 3);
}

#[test]
fn test_schedule_table() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["schedule"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3.5s"))
        .stdout(predicate::str::contains("9s"))
        .stdout(predicate::str::contains("Complete"));
}

#[test]
fn test_schedule_speed_from_config() {
    let (temp_dir, _guard) = setup_test_env("color=never\nspeed=2\n");
    let output = flowsim_cmd(&temp_dir).args(["schedule", "--json"]).output().unwrap();
    assert!(output.status.success());
    let schedule: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schedule["complete_ms"], 4500);
    assert_eq!(schedule["entries"][1]["delay_ms"], 400);
}

#[test]
fn test_progress_for_stage() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["progress", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SQS Queue"))
        .stdout(predicate::str::contains("57%"))
        .stdout(predicate::str::contains("Message published to SQS"));
}

#[test]
fn test_progress_idle() {
    let (temp_dir, _guard) = setup_test_env(RC);
    let output = flowsim_cmd(&temp_dir).args(["progress", "--json"]).output().unwrap();
    assert!(output.status.success());
    let progress: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(progress["percent"], 0);
    assert_eq!(progress["title"], "Ready");
    assert!(progress["current"].is_null());
}

#[test]
fn test_progress_rejects_unknown_stage() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["progress", "7"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid stage"));
}

#[test]
fn test_edges_json() {
    let (temp_dir, _guard) = setup_test_env(RC);
    let output = flowsim_cmd(&temp_dir).args(["edges", "--json"]).output().unwrap();
    assert!(output.status.success());
    let edges: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let edges = edges.as_array().unwrap();
    assert_eq!(edges.len(), 6);
    assert_eq!(edges[0]["start"]["y"], 170.0);
    assert_eq!(edges[0]["end"]["y"], 220.0);
    assert_eq!(edges[3]["activation_delay_ms"], 3500);
    assert_eq!(edges[3]["caption"], "Poll Queue");
}

// =============================================================================
// Time travel and playback
// =============================================================================

#[test]
fn test_simulate_at_time() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["simulate", "--at", "3.6s"])
        .assert()
        .success()
        .stdout(predicate::str::contains("At 3.6s - running"))
        .stdout(predicate::str::contains("SQS Queue"))
        .stdout(predicate::str::contains("57%"));
}

#[test]
fn test_simulate_json_after_completion() {
    let (temp_dir, _guard) = setup_test_env(RC);
    let output = flowsim_cmd(&temp_dir)
        .args(["simulate", "--at", "30s", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let frame: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(frame["at_ms"], 30000);
    assert_eq!(frame["state"], "completed");
    assert_eq!(frame["current"], 6);
    assert_eq!(frame["percent"], 100);
    assert!(frame["edges"].as_array().unwrap().iter().all(|e| e["active"] == true));
}

#[test]
fn test_simulate_rejects_bad_time() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["simulate", "--at", "soon"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid time"));
}

#[test]
fn test_run_fast_json() {
    let (temp_dir, _guard) = setup_test_env(RC);
    let output = flowsim_cmd(&temp_dir)
        .args(["run", "--speed", "100", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let ordinals: Vec<u64> = events
        .iter()
        .filter(|e| e["event"] == "stage_changed")
        .map(|e| e["ordinal"].as_u64().unwrap())
        .collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(events.iter().filter(|e| e["event"] == "completed").count(), 1);
    assert_eq!(events.last().unwrap()["percent"], 100);
}

#[test]
fn test_run_until_stops_early() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["run", "--until", "1s"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API Gateway"))
        .stdout(predicate::str::contains("Stopped before completion"))
        .stdout(predicate::str::contains("SQS Queue").not());
}

#[test]
fn test_run_with_huge_frame_interval() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["run", "--speed", "100", "--frame", "18446744073709551615"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Product added successfully!"));
}

#[test]
fn test_run_rejects_bad_speed() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["run", "--speed", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid speed"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_bad_config_is_user_error() {
    let (temp_dir, _guard) = setup_test_env("speed=fast\n");
    flowsim_cmd(&temp_dir)
        .args(["stages"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"))
        .stderr(predicate::str::contains("line 1: speed must be a positive number"));
}

#[test]
fn test_unknown_config_key_is_ignored() {
    let (temp_dir, _guard) = setup_test_env("color=never\ntheme=dark\n");
    flowsim_cmd(&temp_dir).args(["stages"]).assert().success();
}

// =============================================================================
// Externally driven mode
// =============================================================================

#[test]
fn test_drive_visits_skipped_stages() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["drive"])
        .write_stdin("0\n# jump ahead\n2\ncomplete\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1/7"))
        .stdout(predicate::str::contains("Step 2/7"))
        .stdout(predicate::str::contains("Step 3/7"))
        .stdout(predicate::str::contains("Product added successfully!"));
}

#[test]
fn test_drive_skip_policy() {
    let (temp_dir, _guard) = setup_test_env(RC);
    let output = flowsim_cmd(&temp_dir)
        .args(["drive", "--skip", "--json"])
        .write_stdin("0\n3\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let ordinals: Vec<u64> = stdout
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
        .filter(|e| e["event"] == "stage_changed")
        .map(|e| e["ordinal"].as_u64().unwrap())
        .collect();
    assert_eq!(ordinals, vec![0, 3]);
}

#[test]
fn test_drive_rejects_backwards_report() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["drive"])
        .write_stdin("2\n1\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("line 2"))
        .stderr(predicate::str::contains("only move forward"));
}

#[test]
fn test_drive_fail_and_restart() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["drive"])
        .write_stdin("0\n1\nfail queue timed out\nstart\n0\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Flow failed: queue timed out"));
}

#[test]
fn test_drive_rejects_garbage() {
    let (temp_dir, _guard) = setup_test_env(RC);
    flowsim_cmd(&temp_dir)
        .args(["drive"])
        .write_stdin("jump\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unrecognized line"));
}
