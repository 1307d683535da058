//! Readiness check trait and result types
//!
//! Each named check maps the release context to pass/warn/fail via a fixed
//! predicate (documented on the check), and carries a static `blocking`
//! flag. The flag is part of the versioned catalog, never derived at
//! runtime: changing a check from advisory to blocking is a catalog
//! change, not a data change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a single readiness check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
  Pass,
  Warn,
  Fail,
  /// The input for this check was not supplied
  Unknown,
}

impl fmt::Display for CheckStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CheckStatus::Pass => write!(f, "pass"),
      CheckStatus::Warn => write!(f, "warn"),
      CheckStatus::Fail => write!(f, "fail"),
      CheckStatus::Unknown => write!(f, "unknown"),
    }
  }
}

/// Result of evaluating one check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
  pub name: String,
  pub status: CheckStatus,
  pub blocking: bool,
  pub detail: String,
}

impl CheckOutcome {
  pub fn new(name: impl Into<String>, status: CheckStatus, blocking: bool, detail: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      status,
      blocking,
      detail: detail.into(),
    }
  }
}

/// Inputs to one readiness evaluation pass
///
/// Deterministic fields (defect counts) come from the record store;
/// booleans are supplied by upstream callers. `None` means "not supplied"
/// and evaluates to [`CheckStatus::Unknown`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadinessContext {
  /// Count of open critical/high-severity defects
  pub open_critical_defects: Option<u32>,
  pub tests_passing: Option<bool>,
  pub staging_validated: Option<bool>,
  pub security_review_done: Option<bool>,
  pub changelog_generated: Option<bool>,
  pub docs_updated: Option<bool>,
  pub approvals_complete: Option<bool>,
  /// From the current rollback plan: estimate within the tier's threshold
  pub rollback_below_target: Option<bool>,
}

/// A named readiness check
pub trait ReadinessCheck: Send + Sync {
  /// Unique name for this check (kebab-case)
  fn name(&self) -> &str;

  /// Human-readable description of what this check validates
  fn description(&self) -> &str;

  /// Whether a failure of this check alone forces NO-GO
  fn blocking(&self) -> bool;

  /// Evaluate the check against the context
  fn evaluate(&self, ctx: &ReadinessContext) -> CheckOutcome;
}
