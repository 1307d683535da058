//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A test workspace with a relay.toml and input fixture files
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a workspace with the default configuration
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    let ws = Self { _root: root, path };
    ws.write_config("")?;
    Ok(ws)
  }

  /// Write relay.toml with optional extra TOML appended to the defaults
  pub fn write_config(&self, extra: &str) -> Result<()> {
    let base = r#"[oracle]
timeout_secs = 5

[scheduling]
preferred_days = ["tue", "wed", "thu"]
availability_start_hour = 9
availability_end_hour = 17
window_hours = 2
lookahead_days = 21
"#;
    std::fs::write(self.path.join("relay.toml"), format!("{}\n{}", base, extra))?;
    Ok(())
  }

  /// Write a change set fixture; returns its path
  pub fn write_changes(&self, name: &str, json: &str) -> Result<PathBuf> {
    let path = self.path.join(name);
    std::fs::write(&path, json)?;
    Ok(path)
  }

  /// Write a readiness inputs fixture; returns its path
  pub fn write_readiness(&self, name: &str, json: &str) -> Result<PathBuf> {
    let path = self.path.join(name);
    std::fs::write(&path, json)?;
    Ok(path)
  }

  /// Check if a file exists relative to the workspace
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read the persisted state document
  pub fn read_state(&self) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(self.path.join("relay-state.json"))?;
    Ok(serde_json::from_str(&content)?)
  }
}

/// A fully green readiness fixture
pub fn green_readiness() -> &'static str {
  r#"{
  "open_critical_defects": 0,
  "tests_passing": true,
  "staging_validated": true,
  "security_review_done": true,
  "changelog_generated": true,
  "docs_updated": true,
  "approvals_complete": true,
  "rollback_below_target": true
}"#
}

/// Run the relay CLI, failing the test on a non-zero exit
pub fn run_relay(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_relay_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "relay command failed: relay {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run the relay CLI, returning the output regardless of exit status
pub fn run_relay_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let relay_bin = env!("CARGO_BIN_EXE_relay");

  Command::new(relay_bin)
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run relay")
}
