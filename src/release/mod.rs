//! Release records and lifecycle
//!
//! Maintains the invariants: status only advances forward (no skipping
//! ReadinessEvaluated), bump type is immutable once set, and a release with
//! any blocking check failing can never reach Ready.

pub mod version;

use crate::core::error::{RelayError, RelayResult};
use crate::readiness::CheckOutcome;
use crate::risk::{ChangeProfile, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use version::{BumpType, VersionResolution};

/// Lifecycle status of a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseStatus {
  Draft,
  ReadinessEvaluated,
  Ready,
  Blocked,
  WindowScheduled,
  Deployed,
  RolledBack,
}

impl fmt::Display for ReleaseStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ReleaseStatus::Draft => "draft",
      ReleaseStatus::ReadinessEvaluated => "readiness-evaluated",
      ReleaseStatus::Ready => "ready",
      ReleaseStatus::Blocked => "blocked",
      ReleaseStatus::WindowScheduled => "window-scheduled",
      ReleaseStatus::Deployed => "deployed",
      ReleaseStatus::RolledBack => "rolled-back",
    };
    write!(f, "{}", name)
  }
}

impl ReleaseStatus {
  /// Whether a transition from `self` to `to` is allowed
  ///
  /// Forward-only. Re-evaluation may rewrite ReadinessEvaluated in place;
  /// Blocked and RolledBack are terminal (a new release supersedes).
  pub fn can_transition(self, to: ReleaseStatus) -> bool {
    use ReleaseStatus::*;
    matches!(
      (self, to),
      (Draft, ReadinessEvaluated)
        | (ReadinessEvaluated, ReadinessEvaluated)
        | (ReadinessEvaluated, Ready)
        | (ReadinessEvaluated, Blocked)
        | (Ready, WindowScheduled)
        | (Ready, Blocked)
        | (WindowScheduled, Deployed)
        | (Deployed, RolledBack)
    )
  }
}

/// A single proposed change, input to version resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
  /// Free-form category tag: "feature", "fix", "breaking", "migration", ...
  #[serde(rename = "type")]
  pub change_type: String,
  pub description: String,
  #[serde(default)]
  pub breaking: bool,
  /// Whether this item gets a phased-rollout feature flag
  #[serde(default)]
  pub needs_feature_flag: bool,
}

impl ChangeRecord {
  /// Whether this change carries a data migration or schema change
  pub fn is_migration(&self) -> bool {
    matches!(self.change_type.as_str(), "migration" | "schema")
  }
}

/// The change set driving one release
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChangeSet {
  pub changes: Vec<ChangeRecord>,
}

impl ChangeSet {
  pub fn new(changes: Vec<ChangeRecord>) -> Self {
    Self { changes }
  }

  /// Derive the risk-classification profile from the set
  pub fn profile(&self) -> ChangeProfile {
    ChangeProfile {
      total_changes: self.changes.len(),
      has_db_migration: self.changes.iter().any(|c| c.is_migration()),
      has_api_changes: self.changes.iter().any(|c| c.breaking || c.change_type == "breaking"),
    }
  }

  /// Compacted one-line summary for oracle requests
  pub fn summary(&self) -> String {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for change in &self.changes {
      match counts.iter_mut().find(|(t, _)| *t == change.change_type) {
        Some((_, n)) => *n += 1,
        None => counts.push((change.change_type.clone(), 1)),
      }
    }
    let breaking = self.changes.iter().filter(|c| c.breaking).count();

    let mut parts: Vec<String> = counts.iter().map(|(t, n)| format!("{} {}", n, t)).collect();
    if breaking > 0 {
      parts.push(format!("{} breaking", breaking));
    }
    parts.join(", ")
  }

  /// Items that get a feature flag
  pub fn flagged_items(&self) -> Vec<&ChangeRecord> {
    self.changes.iter().filter(|c| c.needs_feature_flag).collect()
  }
}

/// A release record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
  /// Semver string, the record's identity
  pub version: String,
  pub previous_version: String,
  pub bump_type: BumpType,
  pub risk_level: RiskLevel,
  pub status: ReleaseStatus,
  pub total_changes: usize,
  pub created_at: DateTime<Utc>,

  /// The change records this release was built from; re-evaluation replays
  /// with these, not with whatever change set a later pass happens to carry
  #[serde(default)]
  pub changes: Vec<ChangeRecord>,

  /// Checks from the most recent readiness evaluation, attached read-only
  #[serde(default)]
  pub checks: Vec<CheckOutcome>,

  /// Recorded reason when status is Blocked
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub blocked_reason: Option<String>,
}

impl Release {
  /// Create a draft release from a version resolution and its change set
  pub fn new(resolution: &VersionResolution, changes: &ChangeSet, now: DateTime<Utc>) -> Self {
    Self {
      version: resolution.new_version.to_string(),
      previous_version: resolution.previous_version.to_string(),
      bump_type: resolution.bump_type,
      // Default tier until classification runs
      risk_level: RiskLevel::Medium,
      status: ReleaseStatus::Draft,
      total_changes: changes.changes.len(),
      created_at: now,
      changes: changes.changes.clone(),
      checks: Vec::new(),
      blocked_reason: None,
    }
  }

  /// The stored change records as a change set
  pub fn change_set(&self) -> ChangeSet {
    ChangeSet::new(self.changes.clone())
  }

  /// Transition status, rejecting backward or skipping moves
  pub fn transition(&mut self, to: ReleaseStatus) -> RelayResult<()> {
    if !self.status.can_transition(to) {
      return Err(RelayError::invariant(format!(
        "release {} cannot move {} → {}",
        self.version, self.status, to
      )));
    }
    self.status = to;
    Ok(())
  }

  /// Mark the release blocked with a recorded reason
  pub fn block(&mut self, reason: impl Into<String>) -> RelayResult<()> {
    self.transition(ReleaseStatus::Blocked)?;
    self.blocked_reason = Some(reason.into());
    Ok(())
  }
}
