//! CLI commands for relay
//!
//! This module contains all user-facing command implementations:
//!
//! ## Setup & Inspection
//! - **init**: Initialize relay.toml configuration for a workspace
//! - **status**: Show all tracked releases and flags
//!
//! ## Release Pipeline
//! - **plan**: Resolve the next version for a change set (no state written)
//! - **run**: Execute a full orchestration pass for a change set
//! - **reevaluate**: Re-run the pipeline for releases awaiting a verdict
//! - **resolve**: Settle a CONDITIONAL-GO release with an explicit decision
//! - **deploy** / **rollback**: Record deployment outcomes
//!
//! ## Feature Flags
//! - **flags scan**: Advance phased rollouts and report cleanup candidates
//! - **flags kill**: Fire a kill switch on a flag
//! - **flags archive**: Archive a cleanup-eligible flag
//!
//! Commands load relay.toml and the state file from the current directory.

pub mod deploy;
pub mod flags;
pub mod init;
pub mod plan;
pub mod resolve;
pub mod run;
pub mod status;

pub use deploy::{run_deploy, run_rollback};
pub use flags::{run_flags_archive, run_flags_kill, run_flags_scan};
pub use init::run_init;
pub use plan::run_plan;
pub use resolve::run_resolve;
pub use run::{run_orchestrate, run_reevaluate};
pub use status::run_status;

use crate::core::error::{RelayError, RelayResult, ResultExt};
use crate::readiness::ReadinessContext;
use crate::release::ChangeSet;
use std::fs;
use std::path::Path;

/// Load a change set from a JSON file
pub fn load_changes(path: &Path) -> RelayResult<ChangeSet> {
  let content =
    fs::read_to_string(path).with_context(|| format!("Failed to read change set from {}", path.display()))?;
  serde_json::from_str(&content).map_err(|e| {
    RelayError::with_help(
      format!("Invalid change set in {}: {}", path.display(), e),
      "Expected JSON like {\"changes\": [{\"type\": \"feature\", \"description\": \"...\", \"breaking\": false, \"needs_feature_flag\": true}]}",
    )
  })
}

/// Load readiness inputs from a JSON file; absent file means "nothing supplied"
pub fn load_readiness(path: Option<&Path>) -> RelayResult<ReadinessContext> {
  let Some(path) = path else {
    return Ok(ReadinessContext::default());
  };
  let content =
    fs::read_to_string(path).with_context(|| format!("Failed to read readiness inputs from {}", path.display()))?;
  serde_json::from_str(&content).map_err(|e| {
    RelayError::with_help(
      format!("Invalid readiness inputs in {}: {}", path.display(), e),
      "Expected JSON like {\"tests_passing\": true, \"open_critical_defects\": 0, \"staging_validated\": true}",
    )
  })
}

/// Parse a semver version argument
pub fn parse_version(version: &str) -> RelayResult<semver::Version> {
  semver::Version::parse(version).map_err(|e| {
    RelayError::with_help(
      format!("Invalid version '{}': {}", version, e),
      "Versions must be full semver, e.g. 1.4.2",
    )
  })
}
