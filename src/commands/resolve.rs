use std::env;

use crate::core::config::RelayConfig;
use crate::core::error::{RelayError, RelayResult};
use crate::notify::ConsoleNotifier;
use crate::orchestrator::Engine;
use crate::oracle::StaticOracle;
use crate::store::FileStore;

/// Settle a CONDITIONAL-GO release with an explicit human decision
pub fn run_resolve(version: String, go: bool, no_go: bool, reason: Option<String>) -> RelayResult<()> {
  if go == no_go {
    return Err(RelayError::with_help(
      "Exactly one of --go or --no-go is required",
      "Pass --go to accept the conditions, or --no-go --reason \"...\" to block the release",
    ));
  }
  if no_go && reason.is_none() {
    return Err(RelayError::with_help(
      "--no-go requires --reason",
      "Blocked releases record why, e.g. --reason \"docs must ship with the release\"",
    ));
  }

  let current_dir = env::current_dir()?;
  let config = RelayConfig::load(&current_dir)?;
  let store = FileStore::open(&current_dir);
  let oracle = StaticOracle;
  let notifier = ConsoleNotifier;
  let engine = Engine::new(&config, &store, &oracle, &notifier);

  let reason = reason.unwrap_or_else(|| "conditions accepted".to_string());
  let release = engine.resolve_conditional(&version, go, &reason)?;

  if go {
    println!("✅ Release {} resolved to GO and is now {}", version, release.status);
    println!("💡 Re-run `relay reevaluate <changes.json>` to schedule its deployment window");
  } else {
    println!("🔴 Release {} blocked: {}", version, reason);
  }

  Ok(())
}
