use std::env;

use crate::core::config::RelayConfig;
use crate::core::error::{RelayError, RelayResult};

/// Run the init command
///
/// Writes a relay.toml with the default risk table, scheduling constraints,
/// and rollout phase plan so teams start from documented defaults.
pub fn run_init(force: bool) -> RelayResult<()> {
  let current_dir = env::current_dir()?;

  if RelayConfig::exists(&current_dir) && !force {
    return Err(RelayError::with_help(
      "relay.toml already exists in this directory",
      "Use --force to overwrite it with defaults",
    ));
  }

  let config = RelayConfig::default();
  config.save(&current_dir)?;

  println!("✅ Created relay.toml with default configuration");
  println!();
  println!("   Risk tiers:      low 2h/30m · medium 6h/15m · high 24h/5m · critical 48h/2m");
  println!("   Scheduling:      Tue–Thu preferred, 09:00–17:00, 21-day look-ahead");
  println!("   Rollout phases:  5% → 25% → 50% → 100%");
  println!();
  println!("Next: describe your changes in a JSON file and run `relay run <changes.json>`");

  Ok(())
}
