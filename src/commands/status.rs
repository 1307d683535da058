use serde::Serialize;
use std::env;

use chrono::Utc;

use crate::core::config::RelayConfig;
use crate::core::error::{RelayError, RelayResult};
use crate::flags::FeatureFlag;
use crate::release::Release;
use crate::schedule::DeploymentWindow;
use crate::store::{FileStore, RecordStore};

/// Everything the status command reports
#[derive(Debug, Serialize)]
struct StatusReport {
  releases: Vec<ReleaseStatusLine>,
  flags: Vec<FeatureFlag>,
}

/// One release with its scheduled window, if any
#[derive(Debug, Serialize)]
struct ReleaseStatusLine {
  #[serde(flatten)]
  release: Release,
  #[serde(skip_serializing_if = "Option::is_none")]
  window: Option<DeploymentWindow>,
}

/// Run the status command
pub fn run_status(json: bool) -> RelayResult<()> {
  let current_dir = env::current_dir()?;
  // Status works with defaults when relay.toml is absent; it only reads
  let config = if RelayConfig::exists(&current_dir) {
    RelayConfig::load(&current_dir)?
  } else {
    RelayConfig::default()
  };

  let store = FileStore::open(&current_dir);
  let releases = store.list_releases()?;
  let flags = store.list_flags()?;

  let lines: Vec<ReleaseStatusLine> = releases
    .into_iter()
    .map(|release| {
      let window = store.get_window(&release.version)?;
      Ok(ReleaseStatusLine { release, window })
    })
    .collect::<RelayResult<_>>()?;

  if json {
    let report = StatusReport { releases: lines, flags };
    println!(
      "{}",
      serde_json::to_string_pretty(&report).map_err(|e| RelayError::message(format!("Serialization error: {}", e)))?
    );
    return Ok(());
  }

  if lines.is_empty() && flags.is_empty() {
    println!("No releases tracked yet. Start with `relay run <changes.json>`");
    return Ok(());
  }

  println!("\n📊 Release Status\n");
  println!(
    "{:<12} {:<8} {:<10} {:<20} {:<14} WINDOW",
    "VERSION", "BUMP", "RISK", "STATUS", "CHANGES"
  );
  println!("{:-<100}", "");
  for line in &lines {
    let window_str = match &line.window {
      Some(window) => format!(
        "{} {}–{}",
        window.primary.date, window.primary.start_time, window.primary.end_time
      ),
      None => "-".to_string(),
    };
    let status_str = match &line.release.blocked_reason {
      Some(reason) => format!("{} ({})", line.release.status, reason),
      None => line.release.status.to_string(),
    };
    println!(
      "{:<12} {:<8} {:<10} {:<20} {:<14} {}",
      line.release.version,
      line.release.bump_type.to_string(),
      line.release.risk_level.to_string(),
      status_str,
      line.release.total_changes,
      window_str
    );
  }

  if !flags.is_empty() {
    let now = Utc::now();
    println!("\n🚩 Feature Flags\n");
    println!("{:<28} {:<10} {:<10} {:<10} STATE", "FLAG", "RELEASE", "EXPOSURE", "ENABLED");
    println!("{:-<80}", "");
    for flag in &flags {
      let state = if flag.archived {
        "archived"
      } else {
        match flag.state(now, config.flags.cleanup_aging_days) {
          crate::flags::FlagState::Disabled => "disabled",
          crate::flags::FlagState::Ramping => "ramping",
          crate::flags::FlagState::FullyRolledOut => "fully rolled out",
          crate::flags::FlagState::CleanupEligible => "cleanup-eligible",
        }
      };
      println!(
        "{:<28} {:<10} {:<10} {:<10} {}",
        flag.name,
        flag.release_version,
        format!("{}%", flag.current_percentage),
        if flag.enabled { "yes" } else { "no" },
        state
      );
    }
  }
  println!();

  Ok(())
}
