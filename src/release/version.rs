//! Version resolution: classify a change set into a semver bump
//!
//! The rule-based pass is the default; the oracle may explicitly override
//! it. An oracle error or timeout always falls back to the rule-based
//! result, so resolution never blocks on the assessment service.

use crate::core::error::RelayResult;
use crate::oracle::{AssessmentRequest, Oracle, StructuredFields};
use crate::release::ChangeSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Semantic-version bump type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
  /// Breaking changes
  Major,
  /// New features
  Minor,
  /// Bug fixes and everything else
  Patch,
}

impl fmt::Display for BumpType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BumpType::Major => write!(f, "major"),
      BumpType::Minor => write!(f, "minor"),
      BumpType::Patch => write!(f, "patch"),
    }
  }
}

impl BumpType {
  /// Apply the bump to a semver version
  ///
  /// Major resets minor and patch to 0; minor resets patch to 0; patch
  /// increments patch only.
  pub fn apply(&self, version: &semver::Version) -> semver::Version {
    match self {
      BumpType::Major => semver::Version::new(version.major + 1, 0, 0),
      BumpType::Minor => semver::Version::new(version.major, version.minor + 1, 0),
      BumpType::Patch => semver::Version::new(version.major, version.minor, version.patch + 1),
    }
  }
}

/// Outcome of version resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResolution {
  pub bump_type: BumpType,
  pub previous_version: semver::Version,
  pub new_version: semver::Version,
  /// True when the oracle's explicit override won over the rule pass
  pub oracle_overrode: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rationale: Option<String>,
}

/// Rule-based bump classification
///
/// Any breaking change → major; else any feature → minor; else patch.
pub fn rule_based_bump(changes: &ChangeSet) -> BumpType {
  if changes
    .changes
    .iter()
    .any(|c| c.breaking || c.change_type == "breaking")
  {
    return BumpType::Major;
  }

  if changes
    .changes
    .iter()
    .any(|c| matches!(c.change_type.as_str(), "feature" | "feat"))
  {
    return BumpType::Minor;
  }

  BumpType::Patch
}

/// Resolve the next version for a change set
///
/// `pre_release` is appended verbatim to the computed version and excluded
/// from the numeric arithmetic.
pub fn resolve(
  changes: &ChangeSet,
  current: &semver::Version,
  pre_release: Option<&str>,
  oracle: &dyn Oracle,
  timeout: Duration,
) -> RelayResult<VersionResolution> {
  let rule_based = rule_based_bump(changes);

  let (bump_type, oracle_overrode, rationale) = match oracle.assess(
    &AssessmentRequest::VersionBump {
      rule_based,
      current_version: current.to_string(),
      change_summary: changes.summary(),
    },
    timeout,
  ) {
    Ok(assessment) => match assessment.structured {
      StructuredFields::VersionOverride {
        bump_type: Some(bump),
      } if bump != rule_based => {
        debug!(
          rule_based = %rule_based,
          override_bump = %bump,
          confidence = assessment.confidence,
          "oracle overrode rule-based bump"
        );
        (bump, true, Some(assessment.rationale))
      }
      _ => (rule_based, false, None),
    },
    Err(e) => {
      // Never block on oracle failure: the rule-based result stands
      warn!(error = %e, "oracle unavailable during version resolution, using rule-based bump");
      (rule_based, false, None)
    }
  };

  let mut new_version = bump_type.apply(current);
  if let Some(suffix) = pre_release {
    new_version.pre = semver::Prerelease::new(suffix).map_err(|e| {
      crate::core::error::RelayError::message(format!("invalid pre-release suffix '{}': {}", suffix, e))
    })?;
  }

  debug_assert!(numeric(&new_version) > numeric(current));

  Ok(VersionResolution {
    bump_type,
    previous_version: current.clone(),
    new_version,
    oracle_overrode,
    rationale,
  })
}

/// Numeric core of a version, pre-release suffix stripped
fn numeric(version: &semver::Version) -> semver::Version {
  semver::Version::new(version.major, version.minor, version.patch)
}
