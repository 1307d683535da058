//! Feature flag phased rollout
//!
//! State machine per flag:
//!
//! ```text
//! Disabled(phase 0) → Ramping(phase k, percentage p_k) → ... →
//! FullyRolledOut(100%) → [after aging window] CleanupEligible
//! ```
//!
//! Advancement from phase k to k+1 requires both elapsed time in phase k ≥
//! that phase's duration and no active kill-switch condition. Advancement
//! is monotonic: a flag never regresses phases automatically. A kill
//! switch forces `enabled = false` and freezes `current_percentage` in
//! place without resetting it.
//!
//! Cleanup eligibility is a query, not a destructive action; archival is a
//! separate explicit operation.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::PhaseConfig;
use crate::core::error::{RelayError, RelayResult};

/// Derived lifecycle state of a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagState {
  Disabled,
  Ramping,
  FullyRolledOut,
  CleanupEligible,
}

/// A feature flag attached to a release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlag {
  /// Stable identifier derived from the item name
  pub name: String,
  pub release_version: String,
  pub phases: Vec<PhaseConfig>,
  pub current_phase_index: usize,
  pub current_percentage: u8,
  pub enabled: bool,
  /// Named breach conditions that halt advancement when active
  pub kill_switch_conditions: Vec<String>,
  pub full_rollout_date: Option<DateTime<Utc>>,
  /// When the current phase began (advancement clock)
  pub phase_started_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub archived: bool,
}

/// Result of one advancement attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdvanceOutcome {
  /// Moved to the next phase
  Advanced { phase: usize, percentage: u8 },
  /// Reached 100% this pass
  Completed,
  /// Left in place, with the reason
  Held { reason: String },
}

/// Derive a stable flag name from a free-form item name
///
/// Lowercases, maps runs of non-alphanumerics to single underscores, and
/// trims. The mapping is deterministic so repeated creation converges on
/// the same identifier.
pub fn normalize_flag_name(item: &str) -> String {
  let mut name = String::with_capacity(item.len());
  let mut last_was_sep = true;
  for c in item.chars() {
    if c.is_ascii_alphanumeric() {
      name.push(c.to_ascii_lowercase());
      last_was_sep = false;
    } else if !last_was_sep {
      name.push('_');
      last_was_sep = true;
    }
  }
  while name.ends_with('_') {
    name.pop();
  }
  name
}

impl FeatureFlag {
  /// Create a flag in the Disabled state at phase 0
  ///
  /// The phase plan must be non-empty and end at 100%; anything else would
  /// strand the flag short of full rollout.
  pub fn new(
    name: impl Into<String>,
    release_version: impl Into<String>,
    phases: Vec<PhaseConfig>,
    kill_switch_conditions: Vec<String>,
    now: DateTime<Utc>,
  ) -> RelayResult<Self> {
    let name = name.into();
    if phases.is_empty() {
      return Err(RelayError::message(format!("flag '{}' has an empty phase plan", name)));
    }
    if phases.last().map(|p| p.percentage) != Some(100) {
      return Err(RelayError::message(format!(
        "flag '{}' phase plan must end at 100%",
        name
      )));
    }

    Ok(Self {
      name,
      release_version: release_version.into(),
      phases,
      current_phase_index: 0,
      current_percentage: 0,
      enabled: false,
      kill_switch_conditions,
      full_rollout_date: None,
      phase_started_at: now,
      created_at: now,
      archived: false,
    })
  }

  /// Derived lifecycle state
  pub fn state(&self, now: DateTime<Utc>, aging_days: u32) -> FlagState {
    if self.cleanup_eligible(now, aging_days) {
      FlagState::CleanupEligible
    } else if self.current_percentage == 100 {
      FlagState::FullyRolledOut
    } else if self.enabled {
      FlagState::Ramping
    } else {
      FlagState::Disabled
    }
  }

  /// Begin (or resume) the rollout; restarts the current phase's clock
  pub fn enable(&mut self, now: DateTime<Utc>) {
    if self.enabled || self.current_percentage == 100 {
      return;
    }
    self.enabled = true;
    self.phase_started_at = now;
    if self.current_percentage == 0 {
      // A stored flag may carry a hand-edited plan; missing phases hold at 0%
      if let Some(phase) = self.phases.get(self.current_phase_index) {
        self.current_percentage = phase.percentage;
      }
    }
    info!(flag = %self.name, percentage = self.current_percentage, "feature flag enabled");
  }

  /// Force-disable the flag, freezing exposure in place
  pub fn kill(&mut self, reason: &str) {
    self.enabled = false;
    info!(flag = %self.name, percentage = self.current_percentage, reason, "kill switch fired");
  }

  /// Attempt to advance one phase
  ///
  /// `active_conditions` are the currently-breached monitoring conditions;
  /// any overlap with the flag's kill-switch conditions halts advancement.
  pub fn advance(&mut self, now: DateTime<Utc>, active_conditions: &[String]) -> AdvanceOutcome {
    if !self.enabled {
      return AdvanceOutcome::Held {
        reason: "flag disabled".to_string(),
      };
    }

    if self.current_percentage == 100 {
      return AdvanceOutcome::Held {
        reason: "already fully rolled out".to_string(),
      };
    }

    if let Some(active) = self
      .kill_switch_conditions
      .iter()
      .find(|c| active_conditions.contains(c))
    {
      return AdvanceOutcome::Held {
        reason: format!("kill-switch condition active: {}", active),
      };
    }

    // Index with get(): a stored flag can arrive with a truncated plan
    let Some(phase) = self.phases.get(self.current_phase_index).copied() else {
      return AdvanceOutcome::Held {
        reason: "phase plan exhausted below 100%".to_string(),
      };
    };
    let elapsed = now - self.phase_started_at;
    let required = chrono::Duration::hours(phase.duration_hours as i64);
    if elapsed < required {
      return AdvanceOutcome::Held {
        reason: format!(
          "phase {} needs {}h, {}h elapsed",
          self.current_phase_index,
          phase.duration_hours,
          elapsed.num_hours()
        ),
      };
    }

    let Some(next) = self.phases.get(self.current_phase_index + 1).copied() else {
      return AdvanceOutcome::Held {
        reason: "phase plan exhausted below 100%".to_string(),
      };
    };
    self.current_phase_index += 1;
    self.current_percentage = next.percentage;
    self.phase_started_at = now;
    debug!(
      flag = %self.name,
      phase = self.current_phase_index,
      percentage = self.current_percentage,
      "flag advanced"
    );

    if self.current_percentage == 100 {
      self.full_rollout_date = Some(now);
      AdvanceOutcome::Completed
    } else {
      AdvanceOutcome::Advanced {
        phase: self.current_phase_index,
        percentage: self.current_percentage,
      }
    }
  }

  /// Whether the flag is a cleanup candidate
  pub fn cleanup_eligible(&self, now: DateTime<Utc>, aging_days: u32) -> bool {
    if self.archived || self.current_percentage != 100 {
      return false;
    }
    match self.full_rollout_date {
      Some(rolled_out) => now - rolled_out >= chrono::Duration::days(aging_days as i64),
      None => false,
    }
  }
}

/// Outcome of scanning one flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagScanResult {
  pub flag: FeatureFlag,
  pub outcome: AdvanceOutcome,
  pub cleanup_eligible: bool,
}

/// Scan flags for phase advancement and cleanup eligibility
///
/// Each flag is independent, so the scan fans out across them.
pub fn scan(
  flags: Vec<FeatureFlag>,
  now: DateTime<Utc>,
  active_conditions: &[String],
  aging_days: u32,
) -> Vec<FlagScanResult> {
  flags
    .into_par_iter()
    .map(|mut flag| {
      let outcome = flag.advance(now, active_conditions);
      let cleanup_eligible = flag.cleanup_eligible(now, aging_days);
      FlagScanResult {
        flag,
        outcome,
        cleanup_eligible,
      }
    })
    .collect()
}
