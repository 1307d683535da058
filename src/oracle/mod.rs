//! Assessment Oracle interface
//!
//! All free-form judgment (bump override recommendations, risk narratives,
//! rollback prose, window timing rationale) goes through this one seam so
//! the deterministic core stays unit-testable without an external service.
//! Every call site has a documented rule-based fallback: an oracle error or
//! timeout is logged and never propagated as a fatal error.

use crate::core::error::{RelayError, RelayResult};
use crate::release::version::BumpType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A request to the assessment oracle
///
/// Tagged so transports can route on `type` without inspecting payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssessmentRequest {
  /// Reconcile a rule-based version bump against the change summary
  VersionBump {
    rule_based: BumpType,
    current_version: String,
    change_summary: String,
  },

  /// Qualitative risk narrative for a readiness evaluation
  RiskNarrative {
    version: String,
    blocking_issues: Vec<String>,
    warnings: Vec<String>,
    total_changes: usize,
    has_db_migration: bool,
    has_api_changes: bool,
  },

  /// Step prose and breach triggers for a rollback plan
  RollbackSteps {
    release_version: String,
    rollback_target: String,
    risk_level: String,
    has_db_migration: bool,
    has_api_changes: bool,
  },

  /// Time-of-day proposal for a deployment window
  WindowTiming {
    risk_level: String,
    date: String,
    availability_start_hour: u32,
    availability_end_hour: u32,
  },
}

/// Oracle response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
  /// Short recommendation tag (e.g. "accept", "override")
  pub recommendation: String,
  /// Confidence in [0.0, 1.0]
  pub confidence: f32,
  /// Free-form rationale text
  pub rationale: String,
  /// Structured payload matching the request kind
  #[serde(default)]
  pub structured: StructuredFields,
}

/// Structured oracle output per request kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructuredFields {
  #[default]
  None,

  /// Explicit bump override; absent/None means the rule-based result stands
  VersionOverride { bump_type: Option<BumpType> },

  /// Advisory risk tier plus narrative (never overrides the gate verdict)
  RiskAdvisory {
    tier: Option<String>,
    narrative: String,
  },

  /// Proposed rollback prose, one list per phase
  RollbackProse {
    pre_rollback: Vec<StepProse>,
    rollback: Vec<StepProse>,
    post_rollback: Vec<StepProse>,
    triggers: Vec<String>,
  },

  /// Proposed start hour for the deployment window
  WindowTiming { start_hour: u32, rationale: String },
}

/// Action/verification prose for a single rollback step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepProse {
  pub action: String,
  pub verification: String,
  pub estimated_minutes: u32,
}

/// Assessment oracle
///
/// Implementations must honor `timeout` and return an error rather than
/// blocking past it. Callers treat any error as "no assessment".
pub trait Oracle: Send + Sync {
  fn assess(&self, request: &AssessmentRequest, timeout: Duration) -> RelayResult<Assessment>;
}

/// Oracle that accepts every rule-based result without comment
///
/// The offline default: deterministic output, no override, no narrative.
pub struct StaticOracle;

impl Oracle for StaticOracle {
  fn assess(&self, request: &AssessmentRequest, _timeout: Duration) -> RelayResult<Assessment> {
    let structured = match request {
      AssessmentRequest::VersionBump { .. } => StructuredFields::VersionOverride { bump_type: None },
      AssessmentRequest::RiskNarrative { .. } => StructuredFields::RiskAdvisory {
        tier: None,
        narrative: String::new(),
      },
      // No prose: the planner substitutes its deterministic fallback steps
      AssessmentRequest::RollbackSteps { .. } => StructuredFields::None,
      AssessmentRequest::WindowTiming { .. } => StructuredFields::None,
    };

    Ok(Assessment {
      recommendation: "accept".to_string(),
      confidence: 1.0,
      rationale: String::new(),
      structured,
    })
  }
}

/// Oracle that always fails (used to exercise fallback paths)
pub struct UnavailableOracle;

impl Oracle for UnavailableOracle {
  fn assess(&self, _request: &AssessmentRequest, _timeout: Duration) -> RelayResult<Assessment> {
    Err(RelayError::Oracle("assessment service unavailable".to_string()))
  }
}
