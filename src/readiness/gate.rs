//! Readiness gate: evaluate the check catalog and aggregate a go/no-go
//!
//! The aggregation is deterministic and computable without the oracle:
//! any blocking failure → NO-GO; any warning, unknown, or non-blocking
//! failure → CONDITIONAL-GO plus the conditions needed for full GO;
//! all passing → GO. The oracle contributes only an advisory risk tier and
//! narrative on top.

use crate::core::error::{RelayError, RelayResult};
use crate::oracle::{AssessmentRequest, Oracle, StructuredFields};
use crate::readiness::checks::catalog;
use crate::readiness::trait_def::{CheckOutcome, CheckStatus, ReadinessCheck, ReadinessContext};
use crate::risk::{ChangeProfile, GateSignals, RiskLevel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Aggregated gate recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
  Go,
  ConditionalGo,
  NoGo,
}

impl fmt::Display for Recommendation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Recommendation::Go => write!(f, "GO"),
      Recommendation::ConditionalGo => write!(f, "CONDITIONAL-GO"),
      Recommendation::NoGo => write!(f, "NO-GO"),
    }
  }
}

/// Full result of one readiness evaluation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateReport {
  pub release_version: String,
  pub checks: Vec<CheckOutcome>,
  pub recommendation: Recommendation,
  /// Blocking checks that failed
  pub blocking_issues: Vec<String>,
  /// Warnings and unknowns
  pub warnings: Vec<String>,
  /// Conditions required to reach full GO (CONDITIONAL-GO only)
  pub conditions: Vec<String>,
  /// Oracle-advisory risk tier for the classifier; never flips the verdict
  #[serde(skip_serializing_if = "Option::is_none")]
  pub advisory_tier: Option<RiskLevel>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub narrative: Option<String>,
}

impl GateReport {
  /// Signals consumed by the risk classifier
  pub fn signals(&self) -> GateSignals {
    GateSignals {
      all_checks_passed: self.checks.iter().all(|c| c.status == CheckStatus::Pass),
      warning_count: self.warnings.len(),
    }
  }
}

/// Evaluate the fixed check catalog for a release
///
/// Returns an infeasibility error when no check has any input: a gate with
/// no readiness data is an unresolved result, not a CONDITIONAL-GO.
pub fn evaluate(
  release_version: &str,
  ctx: &ReadinessContext,
  profile: &ChangeProfile,
  oracle: &dyn Oracle,
  timeout: Duration,
) -> RelayResult<GateReport> {
  let checks: Vec<CheckOutcome> = catalog().iter().map(|check| check.evaluate(ctx)).collect();

  if checks.iter().all(|c| c.status == CheckStatus::Unknown) {
    return Err(RelayError::infeasible(format!(
      "no readiness data available for release {}",
      release_version
    )));
  }

  let blocking_issues: Vec<String> = checks
    .iter()
    .filter(|c| c.blocking && c.status == CheckStatus::Fail)
    .map(|c| format!("{}: {}", c.name, c.detail))
    .collect();

  let warnings: Vec<String> = checks
    .iter()
    .filter(|c| matches!(c.status, CheckStatus::Warn | CheckStatus::Unknown))
    .map(|c| format!("{}: {}", c.name, c.detail))
    .collect();

  let nonblocking_failures: Vec<&CheckOutcome> = checks
    .iter()
    .filter(|c| !c.blocking && c.status == CheckStatus::Fail)
    .collect();

  let recommendation = if !blocking_issues.is_empty() {
    Recommendation::NoGo
  } else if !warnings.is_empty() || !nonblocking_failures.is_empty() {
    Recommendation::ConditionalGo
  } else {
    Recommendation::Go
  };

  let conditions = if recommendation == Recommendation::ConditionalGo {
    checks
      .iter()
      .filter(|c| c.status != CheckStatus::Pass)
      .map(|c| format!("resolve {} ({})", c.name, c.status))
      .collect()
  } else {
    Vec::new()
  };

  // Advisory augmentation only; the deterministic verdict above stands
  let (advisory_tier, narrative) = match oracle.assess(
    &AssessmentRequest::RiskNarrative {
      version: release_version.to_string(),
      blocking_issues: blocking_issues.clone(),
      warnings: warnings.clone(),
      total_changes: profile.total_changes,
      has_db_migration: profile.has_db_migration,
      has_api_changes: profile.has_api_changes,
    },
    timeout,
  ) {
    Ok(assessment) => match assessment.structured {
      StructuredFields::RiskAdvisory { tier, narrative } => (
        tier.as_deref().and_then(RiskLevel::parse),
        if narrative.is_empty() { None } else { Some(narrative) },
      ),
      _ => (None, None),
    },
    Err(e) => {
      warn!(error = %e, version = release_version, "oracle unavailable for risk narrative");
      (None, None)
    }
  };

  info!(
    version = release_version,
    recommendation = %recommendation,
    blocking = blocking_issues.len(),
    warnings = warnings.len(),
    "readiness gate evaluated"
  );

  Ok(GateReport {
    release_version: release_version.to_string(),
    checks,
    recommendation,
    blocking_issues,
    warnings,
    conditions,
    advisory_tier,
    narrative,
  })
}
