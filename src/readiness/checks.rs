//! Built-in readiness checks
//!
//! The fixed catalog. Predicate table per check:
//!
//! | check | blocking | pass | warn | fail |
//! |---|---|---|---|---|
//! | open-defects | yes | count == 0 | — | count > 0 |
//! | tests-passing | yes | true | — | false |
//! | staging-validated | yes | true | — | false |
//! | security-review | yes | true | — | false |
//! | changelog-generated | no | true | — | false |
//! | docs-updated | no | true | false | — |
//! | approvals-complete | no | true | false | — |
//! | rollback-speed | no | below target | above target | — |
//!
//! Missing input always maps to `unknown`.

use crate::readiness::{CheckOutcome, CheckStatus, ReadinessCheck, ReadinessContext};

/// Map a supplied boolean to pass plus a failure-side status
fn from_bool(value: Option<bool>, on_false: CheckStatus) -> CheckStatus {
  match value {
    Some(true) => CheckStatus::Pass,
    Some(false) => on_false,
    None => CheckStatus::Unknown,
  }
}

/// No open critical/high-severity defects
pub struct OpenDefects;

impl ReadinessCheck for OpenDefects {
  fn name(&self) -> &str {
    "open-defects"
  }

  fn description(&self) -> &str {
    "Count of open critical/high-severity defects must be zero"
  }

  fn blocking(&self) -> bool {
    true
  }

  fn evaluate(&self, ctx: &ReadinessContext) -> CheckOutcome {
    let (status, detail) = match ctx.open_critical_defects {
      Some(0) => (CheckStatus::Pass, "no open critical/high defects".to_string()),
      Some(n) => (CheckStatus::Fail, format!("{} open critical/high defect(s)", n)),
      None => (CheckStatus::Unknown, "defect count not available".to_string()),
    };
    CheckOutcome::new(self.name(), status, self.blocking(), detail)
  }
}

/// Full test suite passing
pub struct TestsPassing;

impl ReadinessCheck for TestsPassing {
  fn name(&self) -> &str {
    "tests-passing"
  }

  fn description(&self) -> &str {
    "Full test suite passing on the release candidate"
  }

  fn blocking(&self) -> bool {
    true
  }

  fn evaluate(&self, ctx: &ReadinessContext) -> CheckOutcome {
    let status = from_bool(ctx.tests_passing, CheckStatus::Fail);
    CheckOutcome::new(self.name(), status, self.blocking(), "test suite status supplied by CI")
  }
}

/// Release candidate validated in staging
pub struct StagingValidated;

impl ReadinessCheck for StagingValidated {
  fn name(&self) -> &str {
    "staging-validated"
  }

  fn description(&self) -> &str {
    "Release candidate validated in the staging environment"
  }

  fn blocking(&self) -> bool {
    true
  }

  fn evaluate(&self, ctx: &ReadinessContext) -> CheckOutcome {
    let status = from_bool(ctx.staging_validated, CheckStatus::Fail);
    CheckOutcome::new(self.name(), status, self.blocking(), "staging validation sign-off")
  }
}

/// Security review completed
pub struct SecurityReview;

impl ReadinessCheck for SecurityReview {
  fn name(&self) -> &str {
    "security-review"
  }

  fn description(&self) -> &str {
    "Security review completed for the change set"
  }

  fn blocking(&self) -> bool {
    true
  }

  fn evaluate(&self, ctx: &ReadinessContext) -> CheckOutcome {
    let status = from_bool(ctx.security_review_done, CheckStatus::Fail);
    CheckOutcome::new(self.name(), status, self.blocking(), "security review sign-off")
  }
}

/// Changelog generated for the release
pub struct ChangelogGenerated;

impl ReadinessCheck for ChangelogGenerated {
  fn name(&self) -> &str {
    "changelog-generated"
  }

  fn description(&self) -> &str {
    "Changelog entry generated for the release"
  }

  fn blocking(&self) -> bool {
    false
  }

  fn evaluate(&self, ctx: &ReadinessContext) -> CheckOutcome {
    let status = from_bool(ctx.changelog_generated, CheckStatus::Fail);
    CheckOutcome::new(self.name(), status, self.blocking(), "changelog entry present")
  }
}

/// Documentation updated
pub struct DocsUpdated;

impl ReadinessCheck for DocsUpdated {
  fn name(&self) -> &str {
    "docs-updated"
  }

  fn description(&self) -> &str {
    "User-facing documentation updated"
  }

  fn blocking(&self) -> bool {
    false
  }

  fn evaluate(&self, ctx: &ReadinessContext) -> CheckOutcome {
    let status = from_bool(ctx.docs_updated, CheckStatus::Warn);
    CheckOutcome::new(self.name(), status, self.blocking(), "documentation status")
  }
}

/// Required approvals collected
pub struct ApprovalsComplete;

impl ReadinessCheck for ApprovalsComplete {
  fn name(&self) -> &str {
    "approvals-complete"
  }

  fn description(&self) -> &str {
    "All required approvals collected"
  }

  fn blocking(&self) -> bool {
    false
  }

  fn evaluate(&self, ctx: &ReadinessContext) -> CheckOutcome {
    let status = from_bool(ctx.approvals_complete, CheckStatus::Warn);
    CheckOutcome::new(self.name(), status, self.blocking(), "approval status")
  }
}

/// Rollback plan estimate within the risk tier's target
///
/// Consumes the `below_target_speed` signal from a previously generated
/// rollback plan. Advisory only: a slow plan warns, never blocks.
pub struct RollbackSpeed;

impl ReadinessCheck for RollbackSpeed {
  fn name(&self) -> &str {
    "rollback-speed"
  }

  fn description(&self) -> &str {
    "Rollback plan estimate within the risk tier's threshold"
  }

  fn blocking(&self) -> bool {
    false
  }

  fn evaluate(&self, ctx: &ReadinessContext) -> CheckOutcome {
    let (status, detail) = match ctx.rollback_below_target {
      Some(true) => (CheckStatus::Pass, "plan estimate within threshold".to_string()),
      Some(false) => (CheckStatus::Warn, "plan estimate exceeds tier threshold".to_string()),
      None => (CheckStatus::Unknown, "no rollback plan generated yet".to_string()),
    };
    CheckOutcome::new(self.name(), status, self.blocking(), detail)
  }
}

/// The fixed, ordered check catalog
pub fn catalog() -> Vec<Box<dyn ReadinessCheck>> {
  vec![
    Box::new(OpenDefects),
    Box::new(TestsPassing),
    Box::new(StagingValidated),
    Box::new(SecurityReview),
    Box::new(ChangelogGenerated),
    Box::new(DocsUpdated),
    Box::new(ApprovalsComplete),
    Box::new(RollbackSpeed),
  ]
}
