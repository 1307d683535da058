//! Rollback planning
//!
//! Every plan has the same three ordered phases: pre-rollback, rollback,
//! post-rollback verification. The oracle supplies step prose and breach
//! triggers; the engine enforces the phase shape, sequence numbering, and
//! minute rollups regardless of what the oracle returns, and substitutes a
//! single manual-rollback step if the oracle call fails.
//!
//! Plans are created once and never mutated; a new release supersedes its
//! predecessor's plan.

use crate::core::config::RiskParams;
use crate::oracle::{AssessmentRequest, Oracle, StepProse, StructuredFields};
use crate::risk::{ChangeProfile, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Plan identifier (SHA256 of version, target, and tier)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  fn derive(release_version: &str, rollback_target: &str, risk_level: RiskLevel) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(release_version.as_bytes());
    hasher.update(b"|");
    hasher.update(rollback_target.as_bytes());
    hasher.update(b"|");
    hasher.update(risk_level.to_string().as_bytes());
    Self(format!("{:x}", hasher.finalize()))
  }

  /// Short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// A single rollback step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackStep {
  /// Position in the overall plan (1-based, global across phases)
  pub sequence: u32,
  pub action: String,
  pub verification: String,
  pub estimated_minutes: u32,
}

/// A complete, immutable rollback plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackPlan {
  pub id: PlanId,
  pub release_version: String,
  pub rollback_target: String,
  pub risk_level: RiskLevel,

  /// Sum of estimated minutes across the rollback phase
  pub estimated_minutes: u32,
  /// True when the estimate is within the tier's threshold
  pub below_target_speed: bool,

  pub pre_rollback: Vec<RollbackStep>,
  pub rollback: Vec<RollbackStep>,
  pub post_rollback: Vec<RollbackStep>,

  /// Named breach conditions that should trigger the plan
  pub triggers: Vec<String>,

  /// Migrations to reverse; non-empty iff the release carries a migration
  pub migrations_to_reverse: Vec<String>,
  /// Explicitly false (not omitted) when no migration is present
  pub data_backup_required: bool,

  pub created_at: DateTime<Utc>,
}

impl RollbackPlan {
  /// One-line summary for notifications
  pub fn summary(&self) -> String {
    format!(
      "{} steps, ~{} min rollback to {} ({})",
      self.pre_rollback.len() + self.rollback.len() + self.post_rollback.len(),
      self.estimated_minutes,
      self.rollback_target,
      if self.below_target_speed {
        "within target"
      } else {
        "over target"
      }
    )
  }
}

/// Build the rollback plan for a release
pub fn build(
  release_version: &str,
  rollback_target: &str,
  risk_level: RiskLevel,
  params: RiskParams,
  profile: &ChangeProfile,
  migration_names: &[String],
  oracle: &dyn Oracle,
  timeout: Duration,
  now: DateTime<Utc>,
) -> RollbackPlan {
  let prose = match oracle.assess(
    &AssessmentRequest::RollbackSteps {
      release_version: release_version.to_string(),
      rollback_target: rollback_target.to_string(),
      risk_level: risk_level.to_string(),
      has_db_migration: profile.has_db_migration,
      has_api_changes: profile.has_api_changes,
    },
    timeout,
  ) {
    Ok(assessment) => match assessment.structured {
      StructuredFields::RollbackProse {
        pre_rollback,
        rollback,
        post_rollback,
        triggers,
      } if !rollback.is_empty() => Some((pre_rollback, rollback, post_rollback, triggers)),
      _ => None,
    },
    Err(e) => {
      warn!(error = %e, version = release_version, "oracle unavailable for rollback prose, using manual fallback");
      None
    }
  };

  let (pre, roll, post, triggers) = match prose {
    Some(parts) => parts,
    None => fallback_prose(release_version, rollback_target, profile),
  };

  // Enforce the three-phase shape and numbering regardless of oracle output
  let mut sequence = 0u32;
  let number = |steps: Vec<StepProse>, sequence: &mut u32| -> Vec<RollbackStep> {
    steps
      .into_iter()
      .map(|s| {
        *sequence += 1;
        RollbackStep {
          sequence: *sequence,
          action: s.action,
          verification: s.verification,
          estimated_minutes: s.estimated_minutes,
        }
      })
      .collect()
  };

  let pre_rollback = number(pre, &mut sequence);
  let rollback = number(roll, &mut sequence);
  let post_rollback = number(post, &mut sequence);

  let estimated_minutes: u32 = rollback.iter().map(|s| s.estimated_minutes).sum();
  let below_target_speed = estimated_minutes <= params.rollback_threshold_minutes;
  if !below_target_speed {
    // Not auto-blocking; surfaced to the rollback-speed readiness check
    warn!(
      version = release_version,
      estimated_minutes,
      threshold = params.rollback_threshold_minutes,
      "rollback plan estimate exceeds tier threshold"
    );
  }

  let migrations_to_reverse = if profile.has_db_migration {
    if migration_names.is_empty() {
      vec![format!("reverse schema changes introduced in {}", release_version)]
    } else {
      migration_names.to_vec()
    }
  } else {
    // Explicitly empty: callers must not have to distinguish "not
    // applicable" from "not computed"
    Vec::new()
  };

  let plan = RollbackPlan {
    id: PlanId::derive(release_version, rollback_target, risk_level),
    release_version: release_version.to_string(),
    rollback_target: rollback_target.to_string(),
    risk_level,
    estimated_minutes,
    below_target_speed,
    pre_rollback,
    rollback,
    post_rollback,
    triggers,
    migrations_to_reverse,
    data_backup_required: profile.has_db_migration,
    created_at: now,
  };

  info!(
    version = release_version,
    plan_id = %plan.id,
    estimated_minutes,
    below_target = below_target_speed,
    "rollback plan built"
  );

  plan
}

/// Deterministic fallback prose when the oracle has none
fn fallback_prose(
  release_version: &str,
  rollback_target: &str,
  profile: &ChangeProfile,
) -> (Vec<StepProse>, Vec<StepProse>, Vec<StepProse>, Vec<String>) {
  let mut pre = vec![StepProse {
    action: "Announce rollback in the deployment channel and freeze further rollouts".to_string(),
    verification: "Deployment channel acknowledgment".to_string(),
    estimated_minutes: 2,
  }];
  if profile.has_db_migration {
    pre.push(StepProse {
      action: "Take a verified backup of affected tables before touching the schema".to_string(),
      verification: "Backup completes and restores in a scratch environment".to_string(),
      estimated_minutes: 10,
    });
  }

  // Single manual-rollback step per the oracle-failure policy
  let rollback = vec![StepProse {
    action: format!("Manually redeploy {} over {}", rollback_target, release_version),
    verification: format!("Running version reports {}", rollback_target),
    estimated_minutes: 10,
  }];

  let post = vec![
    StepProse {
      action: "Run smoke tests against the restored version".to_string(),
      verification: "Smoke suite green".to_string(),
      estimated_minutes: 5,
    },
    StepProse {
      action: "Confirm error rates and latency return to baseline".to_string(),
      verification: "Dashboards within pre-release bounds for 15 minutes".to_string(),
      estimated_minutes: 15,
    },
  ];

  let triggers = vec![
    "error rate above 5% for 5 minutes".to_string(),
    "p99 latency doubled from baseline".to_string(),
    "health checks failing on more than one instance".to_string(),
  ];

  (pre, rollback, post, triggers)
}
