use std::env;
use std::path::PathBuf;

use chrono::Utc;

use crate::commands::{load_changes, load_readiness, parse_version};
use crate::core::config::RelayConfig;
use crate::core::error::{RelayError, RelayResult};
use crate::notify::{ConsoleNotifier, Notifier, SilentNotifier};
use crate::orchestrator::{Engine, PassInput, PassResult};
use crate::oracle::StaticOracle;
use crate::readiness::Recommendation;
use crate::release::ReleaseStatus;
use crate::store::FileStore;

/// Run a full orchestration pass for a change set
pub fn run_orchestrate(
  changes_path: PathBuf,
  current: String,
  pre_release: Option<String>,
  readiness_path: Option<PathBuf>,
  json: bool,
) -> RelayResult<()> {
  let current_dir = env::current_dir()?;
  let config = RelayConfig::load(&current_dir)?;
  let store = FileStore::open(&current_dir);
  let oracle = StaticOracle;

  let notifier: &dyn Notifier = if json { &SilentNotifier } else { &ConsoleNotifier };
  let engine = Engine::new(&config, &store, &oracle, notifier);

  let changes = load_changes(&changes_path)?;
  if changes.changes.is_empty() {
    return Err(RelayError::with_help(
      "Change set is empty",
      "Add at least one change entry before running the pipeline",
    ));
  }

  let now = Utc::now();
  let input = PassInput {
    changes,
    current_version: parse_version(&current)?,
    pre_release,
    readiness: load_readiness(readiness_path.as_deref())?,
    today: now.date_naive(),
    now,
  };

  let result = engine.orchestrate(&input)?;
  report_pass(&result, json)?;
  Ok(())
}

/// Re-run the pipeline for every release awaiting a verdict
///
/// Each pending release replays against its own stored change records; only
/// the readiness inputs come from the caller.
pub fn run_reevaluate(readiness_path: Option<PathBuf>, json: bool) -> RelayResult<()> {
  let current_dir = env::current_dir()?;
  let config = RelayConfig::load(&current_dir)?;
  let store = FileStore::open(&current_dir);
  let oracle = StaticOracle;

  let notifier: &dyn Notifier = if json { &SilentNotifier } else { &ConsoleNotifier };
  let engine = Engine::new(&config, &store, &oracle, notifier);

  let now = Utc::now();
  let readiness = load_readiness(readiness_path.as_deref())?;
  let results = engine.reevaluate_pending(&readiness, now.date_naive(), now)?;

  if json {
    println!(
      "{}",
      serde_json::to_string_pretty(&results)
        .map_err(|e| RelayError::message(format!("Serialization error: {}", e)))?
    );
  } else if results.is_empty() {
    println!("✅ No releases awaiting a verdict");
  } else {
    for result in &results {
      report_pass(result, false)?;
    }
  }

  Ok(())
}

/// Print the outcome of one pass
fn report_pass(result: &PassResult, json: bool) -> RelayResult<()> {
  if json {
    println!(
      "{}",
      serde_json::to_string_pretty(result).map_err(|e| RelayError::message(format!("Serialization error: {}", e)))?
    );
    return Ok(());
  }

  // The notifier already printed the summary; add the pass bookkeeping
  println!("   Pass {} recorded for release {}", result.pass_id, result.release.version);

  if let Some(report) = &result.report {
    if report.recommendation == Recommendation::ConditionalGo {
      println!();
      println!("   Conditions for full GO:");
      for condition in &report.conditions {
        println!("     • {}", condition);
      }
      println!();
      println!(
        "💡 Settle it with `relay resolve {} --go` or `--no-go --reason \"...\"`",
        result.release.version
      );
    }
  }

  if result.release.status == ReleaseStatus::WindowScheduled {
    for flag in &result.flags_created {
      println!("   🚩 Created feature flag '{}' (disabled, 0%)", flag);
    }
  }

  Ok(())
}
