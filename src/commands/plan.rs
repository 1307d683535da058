use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::commands::{load_changes, parse_version};
use crate::core::config::RelayConfig;
use crate::core::error::{RelayError, RelayResult};
use crate::oracle::StaticOracle;
use crate::release::version;

/// Run the plan command: resolve the next version without writing state
pub fn run_plan(changes_path: PathBuf, current: String, pre_release: Option<String>, json: bool) -> RelayResult<()> {
  let current_dir = env::current_dir()?;
  // Config is optional here; plan only needs the oracle timeout
  let config = if RelayConfig::exists(&current_dir) {
    RelayConfig::load(&current_dir)?
  } else {
    RelayConfig::default()
  };

  let changes = load_changes(&changes_path)?;
  if changes.changes.is_empty() {
    return Err(RelayError::with_help(
      "Change set is empty",
      "Add at least one change entry before planning a release",
    ));
  }

  let current_version = parse_version(&current)?;
  let resolution = version::resolve(
    &changes,
    &current_version,
    pre_release.as_deref(),
    &StaticOracle,
    Duration::from_secs(config.oracle.timeout_secs),
  )?;

  if json {
    println!(
      "{}",
      serde_json::to_string_pretty(&resolution)
        .map_err(|e| RelayError::message(format!("Serialization error: {}", e)))?
    );
  } else {
    println!();
    println!(
      "📦 {} → {} ({} bump)",
      resolution.previous_version, resolution.new_version, resolution.bump_type
    );
    println!("   Changes: {}", changes.summary());
    if resolution.oracle_overrode {
      if let Some(rationale) = &resolution.rationale {
        println!("   Oracle override: {}", rationale);
      }
    }
    println!();
  }

  Ok(())
}
