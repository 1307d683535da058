use std::env;

use chrono::Utc;

use crate::core::config::RelayConfig;
use crate::core::error::RelayResult;
use crate::notify::ConsoleNotifier;
use crate::orchestrator::Engine;
use crate::oracle::StaticOracle;
use crate::store::{FileStore, RecordStore};

/// Record that a release went out in its scheduled window
///
/// Enables the release's feature flags, starting their phase clocks.
pub fn run_deploy(version: String) -> RelayResult<()> {
  let current_dir = env::current_dir()?;
  let config = RelayConfig::load(&current_dir)?;
  let store = FileStore::open(&current_dir);
  let oracle = StaticOracle;
  let notifier = ConsoleNotifier;
  let engine = Engine::new(&config, &store, &oracle, &notifier);

  let release = engine.mark_deployed(&version, Utc::now())?;

  println!("🚀 Release {} marked deployed", release.version);
  println!("💡 Run `relay flags scan` periodically to advance its phased rollouts");

  Ok(())
}

/// Record that a release was rolled back
pub fn run_rollback(version: String) -> RelayResult<()> {
  let current_dir = env::current_dir()?;
  let config = RelayConfig::load(&current_dir)?;
  let store = FileStore::open(&current_dir);
  let oracle = StaticOracle;
  let notifier = ConsoleNotifier;
  let engine = Engine::new(&config, &store, &oracle, &notifier);

  let release = engine.mark_rolled_back(&version)?;

  println!("↩️  Release {} marked rolled back", release.version);
  if let Some(plan) = store.get_plan(&version)? {
    println!("   Plan {}: {}", plan.id, plan.summary());
  }

  Ok(())
}
