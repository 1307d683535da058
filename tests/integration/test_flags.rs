//! Integration tests for feature-flag lifecycle commands

use crate::helpers::{TestWorkspace, green_readiness, run_relay, run_relay_raw};
use anyhow::Result;

/// Run a green pass for a flagged feature and return the workspace
fn workspace_with_flag() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes(
    "changes.json",
    r#"{"changes": [
      {"type": "feature", "description": "New Search UI", "needs_feature_flag": true}
    ]}"#,
  )?;
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
  Ok(ws)
}

#[test]
fn test_flag_created_disabled_with_normalized_name() -> Result<()> {
  let ws = workspace_with_flag()?;

  let state = ws.read_state()?;
  let flag = &state["flags"][0];
  assert_eq!(flag["name"], "new_search_ui");
  assert_eq!(flag["enabled"], false);
  assert_eq!(flag["current_percentage"], 0);
  // Kill switches are wired to the rollback plan's breach triggers
  assert!(!flag["kill_switch_conditions"].as_array().unwrap().is_empty());

  Ok(())
}

#[test]
fn test_deploy_enables_flag_at_first_phase() -> Result<()> {
  let ws = workspace_with_flag()?;

  run_relay(&ws.path, &["deploy", "1.5.0"])?;

  let state = ws.read_state()?;
  let flag = &state["flags"][0];
  assert_eq!(flag["enabled"], true);
  assert_eq!(flag["current_percentage"], 5);

  Ok(())
}

#[test]
fn test_scan_holds_flag_before_phase_duration() -> Result<()> {
  let ws = workspace_with_flag()?;
  run_relay(&ws.path, &["deploy", "1.5.0"])?;

  let output = run_relay(&ws.path, &["flags", "scan", "--json"])?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;

  assert_eq!(json[0]["outcome"]["action"], "held");
  assert_eq!(json[0]["flag"]["current_percentage"], 5);
  assert_eq!(json[0]["cleanup_eligible"], false);

  Ok(())
}

#[test]
fn test_scan_with_active_kill_condition_holds() -> Result<()> {
  let ws = workspace_with_flag()?;
  run_relay(&ws.path, &["deploy", "1.5.0"])?;

  // One of the default breach triggers
  let output = run_relay(
    &ws.path,
    &[
      "flags",
      "scan",
      "--active-condition",
      "error rate above 5% for 5 minutes",
      "--json",
    ],
  )?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;
  assert_eq!(json[0]["outcome"]["action"], "held");

  Ok(())
}

#[test]
fn test_kill_freezes_exposure() -> Result<()> {
  let ws = workspace_with_flag()?;
  run_relay(&ws.path, &["deploy", "1.5.0"])?;

  run_relay(
    &ws.path,
    &["flags", "kill", "new_search_ui", "--reason", "error budget exhausted"],
  )?;

  let state = ws.read_state()?;
  let flag = &state["flags"][0];
  assert_eq!(flag["enabled"], false);
  assert_eq!(flag["current_percentage"], 5, "exposure must freeze, not reset");

  Ok(())
}

#[test]
fn test_archive_rejected_before_cleanup_eligibility() -> Result<()> {
  let ws = workspace_with_flag()?;
  run_relay(&ws.path, &["deploy", "1.5.0"])?;

  let output = run_relay_raw(&ws.path, &["flags", "archive", "new_search_ui"])?;
  assert!(!output.status.success());
  // Infeasibility, not a hard failure
  assert_eq!(output.status.code(), Some(3));

  Ok(())
}

#[test]
fn test_kill_unknown_flag_fails() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let output = run_relay_raw(&ws.path, &["flags", "kill", "missing", "--reason", "x"])?;
  assert!(!output.status.success());

  Ok(())
}
