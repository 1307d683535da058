//! Risk classification
//!
//! Maps a release's characteristics to a discrete risk tier. The tier is
//! the single input that parameterizes rollback planning, deployment
//! scheduling, and post-release monitoring (via the configured
//! [`RiskTable`](crate::core::config::RiskTable)).
//!
//! Floor rules are deterministic and cannot be lowered by the oracle:
//! - any unresolved data migration or irreversible schema change → at
//!   least `high`
//! - any breaking API change → at least `medium`
//! - `low` only for patch-only releases with no migrations, no API
//!   changes, and a fully passing readiness gate
//! - everything else → `medium`

use crate::release::version::BumpType;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Discrete risk tier for a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
  Low,
  Medium,
  High,
  Critical,
}

impl fmt::Display for RiskLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RiskLevel::Low => write!(f, "low"),
      RiskLevel::Medium => write!(f, "medium"),
      RiskLevel::High => write!(f, "high"),
      RiskLevel::Critical => write!(f, "critical"),
    }
  }
}

impl RiskLevel {
  /// Parse a tier name (used for oracle-advisory tiers)
  pub fn parse(name: &str) -> Option<Self> {
    match name.to_lowercase().as_str() {
      "low" => Some(RiskLevel::Low),
      "medium" => Some(RiskLevel::Medium),
      "high" => Some(RiskLevel::High),
      "critical" => Some(RiskLevel::Critical),
      _ => None,
    }
  }
}

/// Change-set characteristics feeding classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ChangeProfile {
  /// Number of changes in the set
  pub total_changes: usize,
  /// Unresolved data migration or irreversible schema change present
  pub has_db_migration: bool,
  /// Breaking API-surface change present
  pub has_api_changes: bool,
}

/// Readiness-gate signals consumed by classification
#[derive(Debug, Clone, Copy, Default)]
pub struct GateSignals {
  /// Every readiness check passed in the most recent evaluation
  pub all_checks_passed: bool,
  /// Number of warnings the gate produced
  pub warning_count: usize,
}

/// Classify a release into a risk tier
///
/// `advisory` is the oracle's candidate tier from the readiness pass; it
/// may raise the result but never lower it below the deterministic floor.
pub fn classify(
  profile: &ChangeProfile,
  bump: BumpType,
  signals: &GateSignals,
  advisory: Option<RiskLevel>,
) -> RiskLevel {
  let floor = if profile.has_db_migration {
    RiskLevel::High
  } else if profile.has_api_changes {
    RiskLevel::Medium
  } else if bump == BumpType::Patch && !profile.has_db_migration && !profile.has_api_changes && signals.all_checks_passed
  {
    // The only conditions permitted to assign `low`
    RiskLevel::Low
  } else {
    RiskLevel::Medium
  };

  let tier = match advisory {
    Some(candidate) if candidate > floor => {
      debug!(floor = %floor, advisory = %candidate, "oracle advisory raised risk tier");
      candidate
    }
    _ => floor,
  };

  debug!(
    total_changes = profile.total_changes,
    has_db_migration = profile.has_db_migration,
    has_api_changes = profile.has_api_changes,
    tier = %tier,
    "classified release risk"
  );

  tier
}
