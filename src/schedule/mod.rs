//! Deployment window scheduling
//!
//! Deterministic constraint satisfaction over a bounded look-ahead: a
//! candidate date is invalid if it falls on a blackout date, and for
//! medium/high/critical tiers Fridays and weekends are additionally
//! invalid. Preferred weekdays bias selection but never override the hard
//! constraints. When no valid date exists inside the look-ahead the
//! scheduler says so explicitly rather than fabricating a window.
//!
//! The oracle proposes a start hour and rationale; the engine validates
//! the proposal against team availability and falls back to the configured
//! default when it is violated or the call fails.

use crate::core::config::{RiskParams, ScheduleConfig};
use crate::oracle::{AssessmentRequest, Oracle, StructuredFields};
use crate::risk::RiskLevel;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A concrete date plus start/end time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSlot {
  pub date: NaiveDate,
  pub start_time: NaiveTime,
  pub end_time: NaiveTime,
}

impl WindowSlot {
  /// The slot's end as a full timestamp
  pub fn end(&self) -> NaiveDateTime {
    self.date.and_time(self.end_time)
  }
}

/// A scheduled deployment window with its backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentWindow {
  pub release_version: String,
  pub risk_level: RiskLevel,
  pub primary: WindowSlot,
  /// A different calendar date satisfying the same constraints
  pub backup: WindowSlot,
  /// Primary window end + the tier's monitoring hours; derived, never
  /// independently generated
  pub monitoring_end: NaiveDateTime,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rationale: Option<String>,
}

/// Scheduling result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScheduleOutcome {
  Scheduled(DeploymentWindow),
  /// No date inside the look-ahead satisfies the hard constraints
  NoWindowFound { searched_days: u32 },
}

/// Whether a date satisfies the hard constraints for a tier
fn is_valid_date(date: NaiveDate, risk_level: RiskLevel, config: &ScheduleConfig) -> bool {
  if config.blackout_dates.contains(&date) {
    return false;
  }

  if risk_level >= RiskLevel::Medium
    && matches!(date.weekday(), Weekday::Fri | Weekday::Sat | Weekday::Sun)
  {
    return false;
  }

  true
}

/// Propose primary and backup windows for a release
///
/// Deterministic for a given (`today`, constraints, tier): re-running with
/// the same inputs reproduces the same valid window.
pub fn propose(
  release_version: &str,
  risk_level: RiskLevel,
  params: RiskParams,
  config: &ScheduleConfig,
  today: NaiveDate,
  oracle: &dyn Oracle,
  timeout: Duration,
) -> ScheduleOutcome {
  let valid_dates: Vec<NaiveDate> = (1..=config.lookahead_days as i64)
    .filter_map(|offset| today.checked_add_days(chrono::Days::new(offset as u64)))
    .filter(|date| is_valid_date(*date, risk_level, config))
    .collect();

  if valid_dates.len() < 2 {
    // Primary and backup must be different calendar dates
    info!(
      version = release_version,
      tier = %risk_level,
      searched_days = config.lookahead_days,
      valid = valid_dates.len(),
      "no deployment window found in look-ahead"
    );
    return ScheduleOutcome::NoWindowFound {
      searched_days: config.lookahead_days,
    };
  }

  // Bias toward preferred weekdays, hard constraints permitting
  let preferred = config.preferred_weekdays();
  let primary_date = valid_dates
    .iter()
    .find(|d| preferred.contains(&d.weekday()))
    .copied()
    .unwrap_or(valid_dates[0]);
  let backup_date = valid_dates
    .iter()
    .find(|d| **d != primary_date && preferred.contains(&d.weekday()))
    .or_else(|| valid_dates.iter().find(|d| **d != primary_date))
    .copied()
    .expect("at least two valid dates checked above");

  // Oracle proposes the time of day; validate against availability
  let mut rationale = None;
  let default_start = config.availability_start_hour;
  let start_hour = match oracle.assess(
    &AssessmentRequest::WindowTiming {
      risk_level: risk_level.to_string(),
      date: primary_date.to_string(),
      availability_start_hour: config.availability_start_hour,
      availability_end_hour: config.availability_end_hour,
    },
    timeout,
  ) {
    Ok(assessment) => match assessment.structured {
      StructuredFields::WindowTiming {
        start_hour,
        rationale: text,
      } if start_hour >= config.availability_start_hour
        && start_hour + config.window_hours <= config.availability_end_hour =>
      {
        rationale = Some(text);
        start_hour
      }
      StructuredFields::WindowTiming { start_hour, .. } => {
        debug!(
          proposed = start_hour,
          "oracle window proposal outside availability, using default start"
        );
        default_start
      }
      _ => default_start,
    },
    Err(e) => {
      warn!(error = %e, version = release_version, "oracle unavailable for window timing, using default start");
      default_start
    }
  };

  // Availability closes by 23:00 (config validation), so both hours fit
  // inside the same calendar day
  let start_time = NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap_or(NaiveTime::MIN);
  let end_time = NaiveTime::from_hms_opt(start_hour + config.window_hours, 0, 0).unwrap_or(NaiveTime::MIN);
  debug_assert!(end_time > start_time, "window must end after it starts");

  let primary = WindowSlot {
    date: primary_date,
    start_time,
    end_time,
  };
  let backup = WindowSlot {
    date: backup_date,
    start_time,
    end_time,
  };

  let monitoring_end = primary.end() + chrono::Duration::hours(params.monitoring_hours as i64);

  info!(
    version = release_version,
    tier = %risk_level,
    primary = %primary_date,
    backup = %backup_date,
    %monitoring_end,
    "deployment window scheduled"
  );

  ScheduleOutcome::Scheduled(DeploymentWindow {
    release_version: release_version.to_string(),
    risk_level,
    primary,
    backup,
    monitoring_end,
    rationale,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::config::RiskTable;
  use crate::oracle::{Assessment, StaticOracle};
  use crate::core::error::RelayResult;

  // Monday 2026-08-31
  fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()
  }

  fn propose_with(risk: RiskLevel, config: &ScheduleConfig) -> ScheduleOutcome {
    propose(
      "2.0.0",
      risk,
      RiskTable::default().params(risk),
      config,
      monday(),
      &StaticOracle,
      Duration::from_secs(1),
    )
  }

  #[test]
  fn test_primary_and_backup_differ_and_avoid_weekends() {
    let config = ScheduleConfig::default();
    let outcome = propose_with(RiskLevel::High, &config);
    match outcome {
      ScheduleOutcome::Scheduled(window) => {
        assert_ne!(window.primary.date, window.backup.date);
        for slot in [window.primary, window.backup] {
          assert!(!matches!(
            slot.date.weekday(),
            Weekday::Fri | Weekday::Sat | Weekday::Sun
          ));
        }
      }
      ScheduleOutcome::NoWindowFound { .. } => panic!("expected a window"),
    }
  }

  #[test]
  fn test_low_risk_may_use_friday() {
    // Blackout everything except a Friday and a Saturday
    let friday = NaiveDate::from_ymd_opt(2026, 9, 4).unwrap();
    let saturday = NaiveDate::from_ymd_opt(2026, 9, 5).unwrap();
    let config = ScheduleConfig {
      blackout_dates: (1..=21)
        .filter_map(|offset| monday().checked_add_days(chrono::Days::new(offset)))
        .filter(|d| *d != friday && *d != saturday)
        .collect(),
      ..Default::default()
    };

    match propose_with(RiskLevel::Low, &config) {
      ScheduleOutcome::Scheduled(window) => {
        assert_eq!(window.primary.date, friday);
        assert_eq!(window.backup.date, saturday);
      }
      ScheduleOutcome::NoWindowFound { .. } => panic!("low tier should accept Friday/Saturday"),
    }

    // The same calendar is infeasible one tier up
    assert!(matches!(
      propose_with(RiskLevel::Medium, &config),
      ScheduleOutcome::NoWindowFound { .. }
    ));
  }

  #[test]
  fn test_blackout_covering_lookahead_yields_no_window() {
    let config = ScheduleConfig {
      blackout_dates: (1..=21)
        .filter_map(|offset| monday().checked_add_days(chrono::Days::new(offset)))
        .collect(),
      ..Default::default()
    };

    match propose_with(RiskLevel::Critical, &config) {
      ScheduleOutcome::NoWindowFound { searched_days } => assert_eq!(searched_days, 21),
      ScheduleOutcome::Scheduled(_) => panic!("expected no window"),
    }
  }

  #[test]
  fn test_monitoring_end_derived_from_tier_table() {
    let config = ScheduleConfig::default();
    for risk in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical] {
      match propose_with(risk, &config) {
        ScheduleOutcome::Scheduled(window) => {
          let hours = RiskTable::default().params(risk).monitoring_hours as i64;
          assert_eq!(
            window.monitoring_end,
            window.primary.end() + chrono::Duration::hours(hours)
          );
        }
        ScheduleOutcome::NoWindowFound { .. } => panic!("expected a window for {}", risk),
      }
    }
  }

  #[test]
  fn test_preferred_days_bias_selection() {
    let config = ScheduleConfig {
      preferred_days: vec!["thu".to_string()],
      ..Default::default()
    };
    match propose_with(RiskLevel::Medium, &config) {
      ScheduleOutcome::Scheduled(window) => {
        assert_eq!(window.primary.date.weekday(), Weekday::Thu);
        assert_eq!(window.backup.date.weekday(), Weekday::Thu);
      }
      ScheduleOutcome::NoWindowFound { .. } => panic!("expected a window"),
    }
  }

  #[test]
  fn test_latest_availability_window_still_ends_after_start() {
    // The last slot a valid config can express: 21:00–23:00
    let config = ScheduleConfig {
      availability_start_hour: 21,
      availability_end_hour: 23,
      ..Default::default()
    };

    match propose_with(RiskLevel::Medium, &config) {
      ScheduleOutcome::Scheduled(window) => {
        assert_eq!(window.primary.start_time, NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        assert_eq!(window.primary.end_time, NaiveTime::from_hms_opt(23, 0, 0).unwrap());
        assert!(window.primary.end_time > window.primary.start_time);
        assert!(window.primary.end() > window.primary.date.and_time(window.primary.start_time));
        assert!(window.monitoring_end > window.primary.end());
      }
      ScheduleOutcome::NoWindowFound { .. } => panic!("expected a window"),
    }
  }

  #[test]
  fn test_rescheduling_is_deterministic() {
    let config = ScheduleConfig::default();
    let first = propose_with(RiskLevel::High, &config);
    let second = propose_with(RiskLevel::High, &config);
    match (first, second) {
      (ScheduleOutcome::Scheduled(a), ScheduleOutcome::Scheduled(b)) => {
        assert_eq!(a.primary, b.primary);
        assert_eq!(a.backup, b.backup);
      }
      _ => panic!("expected windows"),
    }
  }

  #[test]
  fn test_out_of_hours_oracle_proposal_rejected() {
    struct NightOwlOracle;
    impl Oracle for NightOwlOracle {
      fn assess(&self, _request: &AssessmentRequest, _timeout: Duration) -> RelayResult<Assessment> {
        Ok(Assessment {
          recommendation: "propose".to_string(),
          confidence: 0.8,
          rationale: String::new(),
          structured: StructuredFields::WindowTiming {
            start_hour: 23,
            rationale: "low traffic".to_string(),
          },
        })
      }
    }

    let config = ScheduleConfig::default();
    let outcome = propose(
      "2.0.0",
      RiskLevel::Medium,
      RiskTable::default().params(RiskLevel::Medium),
      &config,
      monday(),
      &NightOwlOracle,
      Duration::from_secs(1),
    );
    match outcome {
      ScheduleOutcome::Scheduled(window) => {
        // Falls back to the availability start, not the 23:00 proposal
        assert_eq!(window.primary.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
      }
      ScheduleOutcome::NoWindowFound { .. } => panic!("expected a window"),
    }
  }
}
