//! Integration tests for `relay init` and `relay status`

use crate::helpers::{TestWorkspace, run_relay, run_relay_raw};
use anyhow::Result;
use tempfile::TempDir;

#[test]
fn test_init_creates_config() -> Result<()> {
  let dir = TempDir::new()?;

  run_relay(dir.path(), &["init"])?;
  assert!(dir.path().join("relay.toml").exists());

  let content = std::fs::read_to_string(dir.path().join("relay.toml"))?;
  assert!(content.contains("[risk"), "should write the risk table");
  assert!(content.contains("lookahead_days"), "should write scheduling defaults");

  Ok(())
}

#[test]
fn test_init_refuses_to_overwrite_without_force() -> Result<()> {
  let dir = TempDir::new()?;
  run_relay(dir.path(), &["init"])?;

  let output = run_relay_raw(dir.path(), &["init"])?;
  assert!(!output.status.success(), "second init must fail without --force");

  run_relay(dir.path(), &["init", "--force"])?;
  Ok(())
}

#[test]
fn test_status_on_empty_workspace() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_relay(&ws.path, &["status"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("No releases tracked yet"));

  let output = run_relay(&ws.path, &["status", "--json"])?;
  let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout))?;
  assert_eq!(json["releases"].as_array().map(Vec::len), Some(0));

  Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;
  // Availability window inverted
  std::fs::write(
    ws.path.join("relay.toml"),
    "[scheduling]\navailability_start_hour = 18\navailability_end_hour = 9\n",
  )?;

  let changes = ws.write_changes("changes.json", r#"{"changes": [{"type": "fix", "description": "x"}]}"#)?;
  let output = run_relay_raw(
    &ws.path,
    &["run", changes.to_str().unwrap(), "--current", "1.0.0"],
  )?;
  assert!(!output.status.success());
  // Config errors use a dedicated exit code
  assert_eq!(output.status.code(), Some(2));

  Ok(())
}
