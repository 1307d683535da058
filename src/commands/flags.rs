use std::env;

use chrono::Utc;

use crate::core::config::RelayConfig;
use crate::core::error::{RelayError, RelayResult};
use crate::flags::AdvanceOutcome;
use crate::notify::ConsoleNotifier;
use crate::orchestrator::Engine;
use crate::oracle::StaticOracle;
use crate::store::{FileStore, RecordStore};
use crate::ui::progress::ScanProgress;

/// Scan all flags: advance due phases, report holds and cleanup candidates
pub fn run_flags_scan(active_conditions: Vec<String>, json: bool) -> RelayResult<()> {
  let current_dir = env::current_dir()?;
  let config = RelayConfig::load(&current_dir)?;
  let store = FileStore::open(&current_dir);
  let oracle = StaticOracle;
  let notifier = ConsoleNotifier;
  let engine = Engine::new(&config, &store, &oracle, &notifier);

  let flag_count = store.list_flags()?.iter().filter(|f| !f.archived).count();
  let mut progress = if !json && flag_count > 0 {
    Some(ScanProgress::new(flag_count, "scanning flags"))
  } else {
    None
  };

  let results = engine.scan_flags(Utc::now(), &active_conditions)?;
  if let Some(progress) = progress.as_mut() {
    for _ in &results {
      progress.inc();
    }
  }

  if json {
    println!(
      "{}",
      serde_json::to_string_pretty(&results)
        .map_err(|e| RelayError::message(format!("Serialization error: {}", e)))?
    );
    return Ok(());
  }

  if results.is_empty() {
    println!("✅ No active flags to scan");
    return Ok(());
  }

  println!("\n🚩 Flag Scan\n");
  println!("{:<28} {:<10} {:<10} OUTCOME", "FLAG", "RELEASE", "EXPOSURE");
  println!("{:-<90}", "");
  for result in &results {
    let outcome = match &result.outcome {
      AdvanceOutcome::Advanced { phase, percentage } => format!("advanced to phase {} ({}%)", phase, percentage),
      AdvanceOutcome::Completed => "fully rolled out".to_string(),
      AdvanceOutcome::Held { reason } => format!("held: {}", reason),
    };
    println!(
      "{:<28} {:<10} {:<10} {}",
      result.flag.name,
      result.flag.release_version,
      format!("{}%", result.flag.current_percentage),
      outcome
    );
    if result.cleanup_eligible {
      println!(
        "{:<28} {:<10} {:<10} 🧹 cleanup-eligible (archive with `relay flags archive {}`)",
        "", "", "", result.flag.name
      );
    }
  }
  println!();

  Ok(())
}

/// Fire a kill switch on a flag
pub fn run_flags_kill(name: String, reason: String) -> RelayResult<()> {
  let current_dir = env::current_dir()?;
  let config = RelayConfig::load(&current_dir)?;
  let store = FileStore::open(&current_dir);
  let oracle = StaticOracle;
  let notifier = ConsoleNotifier;
  let engine = Engine::new(&config, &store, &oracle, &notifier);

  let flag = engine.kill_flag(&name, &reason)?;

  println!(
    "🔴 Kill switch fired on '{}' (frozen at {}%): {}",
    flag.name, flag.current_percentage, reason
  );

  Ok(())
}

/// Archive a cleanup-eligible flag
pub fn run_flags_archive(name: String) -> RelayResult<()> {
  let current_dir = env::current_dir()?;
  let config = RelayConfig::load(&current_dir)?;
  let store = FileStore::open(&current_dir);
  let oracle = StaticOracle;
  let notifier = ConsoleNotifier;
  let engine = Engine::new(&config, &store, &oracle, &notifier);

  let flag = engine.archive_flag(&name, Utc::now())?;

  println!("🧹 Archived flag '{}' (rolled out {})", flag.name, match flag.full_rollout_date {
    Some(date) => date.format("%Y-%m-%d").to_string(),
    None => "unknown".to_string(),
  });

  Ok(())
}
