//! Integration tests for `relay plan`

use crate::helpers::{TestWorkspace, run_relay, run_relay_raw};
use anyhow::Result;

#[test]
fn test_plan_patch_bump() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes(
    "changes.json",
    r#"{"changes": [
      {"type": "fix", "description": "off-by-one in pagination"},
      {"type": "fix", "description": "stale cache entry on logout"}
    ]}"#,
  )?;

  let output = run_relay(
    &ws.path,
    &["plan", changes.to_str().unwrap(), "--current", "1.4.2", "--json"],
  )?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;

  assert_eq!(json["bump_type"], "patch");
  assert_eq!(json["new_version"], "1.4.3");
  assert_eq!(json["oracle_overrode"], false);

  Ok(())
}

#[test]
fn test_plan_breaking_change_bumps_major() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes(
    "changes.json",
    r#"{"changes": [
      {"type": "feature", "description": "new search"},
      {"type": "fix", "description": "drop legacy endpoint", "breaking": true}
    ]}"#,
  )?;

  let output = run_relay(
    &ws.path,
    &["plan", changes.to_str().unwrap(), "--current", "1.4.2", "--json"],
  )?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;

  assert_eq!(json["bump_type"], "major");
  assert_eq!(json["new_version"], "2.0.0");

  Ok(())
}

#[test]
fn test_plan_pre_release_suffix() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes(
    "changes.json",
    r#"{"changes": [{"type": "feature", "description": "beta search"}]}"#,
  )?;

  let output = run_relay(
    &ws.path,
    &[
      "plan",
      changes.to_str().unwrap(),
      "--current",
      "1.4.2",
      "--pre-release",
      "rc.1",
      "--json",
    ],
  )?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;
  assert_eq!(json["new_version"], "1.5.0-rc.1");

  Ok(())
}

#[test]
fn test_plan_rejects_empty_change_set() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes("changes.json", r#"{"changes": []}"#)?;

  let output = run_relay_raw(
    &ws.path,
    &["plan", changes.to_str().unwrap(), "--current", "1.0.0"],
  )?;
  assert!(!output.status.success());

  Ok(())
}

#[test]
fn test_plan_rejects_invalid_version() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let changes = ws.write_changes(
    "changes.json",
    r#"{"changes": [{"type": "fix", "description": "x"}]}"#,
  )?;

  let output = run_relay_raw(
    &ws.path,
    &["plan", changes.to_str().unwrap(), "--current", "not-a-version"],
  )?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Invalid version"));

  Ok(())
}
