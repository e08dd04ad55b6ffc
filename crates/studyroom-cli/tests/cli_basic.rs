//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

mod common;

use common::{run_cli_failure, run_cli_success, run_json};

#[test]
fn test_card_add_review_due() {
    let dir = tempfile::tempdir().unwrap();
    let card = run_json(dir.path(), &["card", "add", "ephemeral"]);
    let id = card["id"].as_str().unwrap();
    assert_eq!(card["mastery_state"], "new");

    let due = run_json(dir.path(), &["card", "due"]);
    assert_eq!(due.as_array().unwrap().len(), 1);

    let reviewed = run_json(dir.path(), &["card", "review", id, "good"]);
    assert_eq!(reviewed["repetition_count"], 1);
    assert_eq!(reviewed["interval_days"], 1);

    let due = run_json(dir.path(), &["card", "due"]);
    assert!(due.as_array().unwrap().is_empty());

    let summary = run_json(dir.path(), &["card", "summary"]);
    assert_eq!(summary["total"], 1);

    let log = run_json(dir.path(), &["log"]);
    assert_eq!(log[0]["type"], "card_reviewed");
}

#[test]
fn test_card_review_rejects_bad_quality() {
    let dir = tempfile::tempdir().unwrap();
    let card = run_json(dir.path(), &["card", "add", "x"]);
    let id = card["id"].as_str().unwrap();
    let (_, stderr, code) = run_cli_failure(dir.path(), &["card", "review", id, "7"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_recurring_task_completion() {
    let dir = tempfile::tempdir().unwrap();
    let task = run_json(
        dir.path(),
        &[
            "task", "add", "Water plants", "--due", "2024-01-31T09:00:00Z", "--repeat", "monthly",
            "--subtask", "ferns", "--subtask", "cacti",
        ],
    );
    let id = task["id"].as_str().unwrap();
    assert_eq!(task["recurrence_rule"]["type"], "monthly");

    let outcome = run_json(dir.path(), &["task", "complete", id]);
    assert_eq!(outcome["completed"]["status"], "completed");
    let successor = &outcome["successor"];
    assert_eq!(successor["status"], "open");
    assert_eq!(successor["previous_id"], id);
    assert_eq!(successor["subtasks"][0]["completed"], false);

    let open = run_json(dir.path(), &["task", "list", "--open"]);
    assert_eq!(open.as_array().unwrap().len(), 1);
}

#[test]
fn test_recurring_task_past_end_date() {
    let dir = tempfile::tempdir().unwrap();
    let task = run_json(
        dir.path(),
        &[
            "task", "add", "Demo", "--due", "2024-01-01T12:00:00Z", "--repeat", "weekly",
            "--every", "2", "--until", "2024-01-10T12:00:00Z",
        ],
    );
    let id = task["id"].as_str().unwrap();

    let outcome = run_json(dir.path(), &["task", "complete", id]);
    assert!(outcome["successor"].is_null());

    let upcoming = run_json(dir.path(), &["task", "upcoming", id]);
    assert!(upcoming.as_array().unwrap().is_empty());
}

#[test]
fn test_timer_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let focus = run_json(dir.path(), &["timer", "start"]);
    assert_eq!(focus["session_type"], "focus");
    assert_eq!(focus["state"], "running");

    run_json(dir.path(), &["timer", "pause"]);
    run_cli_failure(dir.path(), &["timer", "pause"]);
    run_json(dir.path(), &["timer", "resume"]);

    let done = run_json(dir.path(), &["timer", "tick", "1500"]);
    assert_eq!(done["state"], "completed");

    // Breaks auto-start by default.
    let next = run_json(dir.path(), &["timer", "next"]);
    assert_eq!(next["kind"], "started");
    assert_eq!(next["session_type"], "short_break");
    assert_eq!(next["completed_focus_count"], 1);

    run_json(dir.path(), &["timer", "tick", "300"]);
    let next = run_json(dir.path(), &["timer", "next"]);
    assert_eq!(next["kind"], "pending");
    assert_eq!(next["session_type"], "focus");

    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["pending"]["session_type"], "focus");

    let focus = run_json(dir.path(), &["timer", "start-pending"]);
    assert_eq!(focus["state"], "running");
    assert_eq!(focus["completed_focus_count"], 1);

    let history = run_json(dir.path(), &["timer", "history"]);
    assert_eq!(history.as_array().unwrap().len(), 3);
}

#[test]
fn test_timer_without_session() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_failure(dir.path(), &["timer", "tick", "10"]);
    let status = run_json(dir.path(), &["timer", "status"]);
    assert!(status["session"].is_null());
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let value = run_cli_success(dir.path(), &["config", "get", "cycle.focus_duration"]);
    assert_eq!(value.trim(), "25");

    run_cli_success(dir.path(), &["config", "set", "review.easy_bonus_days", "2"]);
    let value = run_cli_success(dir.path(), &["config", "get", "review.easy_bonus_days"]);
    assert_eq!(value.trim(), "2");

    run_cli_failure(dir.path(), &["config", "set", "no.such.key", "1"]);
    run_cli_failure(dir.path(), &["config", "set", "review.minimum_ease", "3.0"]);

    run_cli_success(dir.path(), &["config", "reset"]);
    let value = run_cli_success(dir.path(), &["config", "get", "review.easy_bonus_days"]);
    assert_eq!(value.trim(), "0");
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let script = run_cli_success(dir.path(), &["completions", "bash"]);
    assert!(script.contains("studyroom"));
}
