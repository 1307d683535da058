//! Integration tests for the full orchestration pipeline

use crate::helpers::{TestWorkspace, green_readiness, run_relay, run_relay_raw};
use anyhow::Result;

fn fix_changes() -> &'static str {
  r#"{"changes": [{"type": "fix", "description": "stale cache entry on logout"}]}"#
}

#[test]
fn test_green_pass_schedules_a_window() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes("changes.json", fix_changes())?;
  let readiness = ws.write_readiness("readiness.json", green_readiness())?;

  let output = run_relay(
    &ws.path,
    &[
      "run",
      changes.to_str().unwrap(),
      "--current",
      "1.4.2",
      "--readiness",
      readiness.to_str().unwrap(),
      "--json",
    ],
  )?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;

  assert_eq!(json["release"]["version"], "1.4.3");
  assert_eq!(json["release"]["status"], "WindowScheduled");
  assert_eq!(json["report"]["recommendation"], "go");
  // Clean patch release with a passing gate classifies low
  assert_eq!(json["release"]["risk_level"], "low");
  assert!(json["window"].is_object(), "a window should be scheduled");
  assert!(json["plan"].is_object(), "a rollback plan should exist");

  // Records persisted to the state file
  assert!(ws.file_exists("relay-state.json"));
  let state = ws.read_state()?;
  assert_eq!(state["releases"].as_array().map(Vec::len), Some(1));
  assert_eq!(state["plans"].as_array().map(Vec::len), Some(1));
  assert_eq!(state["windows"].as_array().map(Vec::len), Some(1));

  Ok(())
}

#[test]
fn test_blocking_failure_blocks_the_release() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes("changes.json", fix_changes())?;
  let readiness = ws.write_readiness(
    "readiness.json",
    r#"{
      "open_critical_defects": 2,
      "tests_passing": true,
      "staging_validated": true,
      "security_review_done": true,
      "changelog_generated": true,
      "docs_updated": true,
      "approvals_complete": true,
      "rollback_below_target": true
    }"#,
  )?;

  let output = run_relay(
    &ws.path,
    &[
      "run",
      changes.to_str().unwrap(),
      "--current",
      "1.4.2",
      "--readiness",
      readiness.to_str().unwrap(),
      "--json",
    ],
  )?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;

  assert_eq!(json["release"]["status"], "Blocked");
  assert_eq!(json["report"]["recommendation"], "no-go");
  assert!(json["window"].is_null(), "no window for a NO-GO release");

  let state = ws.read_state()?;
  assert_eq!(state["windows"].as_array().map(Vec::len), Some(0));
  assert_eq!(state["flags"].as_array().map(Vec::len), Some(0));

  Ok(())
}

#[test]
fn test_conditional_resolve_then_reevaluate() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes("changes.json", fix_changes())?;
  // docs not updated: advisory warning, conditional go
  let conditional = ws.write_readiness(
    "conditional.json",
    r#"{
      "open_critical_defects": 0,
      "tests_passing": true,
      "staging_validated": true,
      "security_review_done": true,
      "changelog_generated": true,
      "docs_updated": false,
      "approvals_complete": true,
      "rollback_below_target": true
    }"#,
  )?;

  let output = run_relay(
    &ws.path,
    &[
      "run",
      changes.to_str().unwrap(),
      "--current",
      "1.4.2",
      "--readiness",
      conditional.to_str().unwrap(),
      "--json",
    ],
  )?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;
  assert_eq!(json["release"]["status"], "ReadinessEvaluated");
  assert_eq!(json["report"]["recommendation"], "conditional-go");

  // Explicit human decision accepts the conditions
  run_relay(&ws.path, &["resolve", "1.4.3", "--go"])?;

  // The next periodic pass finishes scheduling from the stored change set
  let readiness = ws.write_readiness("green.json", green_readiness())?;
  let output = run_relay(
    &ws.path,
    &["reevaluate", "--readiness", readiness.to_str().unwrap(), "--json"],
  )?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;
  assert_eq!(json[0]["release"]["status"], "WindowScheduled");

  Ok(())
}

#[test]
fn test_resolve_no_go_requires_reason() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes("changes.json", fix_changes())?;
  let conditional = ws.write_readiness(
    "conditional.json",
    r#"{"tests_passing": true, "staging_validated": true, "security_review_done": true, "open_critical_defects": 0}"#,
  )?;

  run_relay(
    &ws.path,
    &[
      "run",
      changes.to_str().unwrap(),
      "--current",
      "1.4.2",
      "--readiness",
      conditional.to_str().unwrap(),
      "--json",
    ],
  )?;

  let output = run_relay_raw(&ws.path, &["resolve", "1.4.3", "--no-go"])?;
  assert!(!output.status.success(), "--no-go without --reason must fail");

  run_relay(
    &ws.path,
    &["resolve", "1.4.3", "--no-go", "--reason", "changelog must ship"],
  )?;
  let state = ws.read_state()?;
  assert_eq!(state["releases"][0]["status"], "Blocked");
  assert_eq!(state["releases"][0]["blocked_reason"], "changelog must ship");

  Ok(())
}

#[test]
fn test_deploy_and_rollback_lifecycle() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes("changes.json", fix_changes())?;
  let readiness = ws.write_readiness("readiness.json", green_readiness())?;

  run_relay(
    &ws.path,
    &[
      "run",
      changes.to_str().unwrap(),
      "--current",
      "1.4.2",
      "--readiness",
      readiness.to_str().unwrap(),
      "--json",
    ],
  )?;

  run_relay(&ws.path, &["deploy", "1.4.3"])?;
  let state = ws.read_state()?;
  assert_eq!(state["releases"][0]["status"], "Deployed");

  run_relay(&ws.path, &["rollback", "1.4.3"])?;
  let state = ws.read_state()?;
  assert_eq!(state["releases"][0]["status"], "RolledBack");

  // Terminal: rolling back twice is an invariant violation (exit code 4)
  let output = run_relay_raw(&ws.path, &["rollback", "1.4.3"])?;
  assert_eq!(output.status.code(), Some(4));

  Ok(())
}

#[test]
fn test_run_without_readiness_data_blocks_explicitly() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes("changes.json", fix_changes())?;

  let output = run_relay(
    &ws.path,
    &["run", changes.to_str().unwrap(), "--current", "1.4.2", "--json"],
  )?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;

  assert_eq!(json["release"]["status"], "Blocked");
  let reason = json["release"]["blocked_reason"].as_str().unwrap_or_default();
  assert!(reason.contains("no readiness data"), "got: {}", reason);

  Ok(())
}

#[test]
fn test_migration_release_classifies_high_with_backup_plan() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes(
    "changes.json",
    r#"{"changes": [
      {"type": "migration", "description": "split users table"},
      {"type": "feature", "description": "profile search"}
    ]}"#,
  )?;
  let readiness = ws.write_readiness("readiness.json", green_readiness())?;

  let output = run_relay(
    &ws.path,
    &[
      "run",
      changes.to_str().unwrap(),
      "--current",
      "1.4.2",
      "--readiness",
      readiness.to_str().unwrap(),
      "--json",
    ],
  )?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;

  assert_eq!(json["release"]["risk_level"], "high");
  assert_eq!(json["plan"]["data_backup_required"], true);
  assert_eq!(json["plan"]["migrations_to_reverse"][0], "split users table");

  Ok(())
}
