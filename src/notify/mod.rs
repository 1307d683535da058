//! Outbound notification
//!
//! Exactly one summary per orchestration pass, successful or not.
//! Delivery is fire-and-forget: a notifier error is logged by the caller
//! and never rolls back state already persisted.

use crate::core::error::RelayResult;
use crate::readiness::Recommendation;
use crate::release::{BumpType, ReleaseStatus};
use crate::risk::RiskLevel;
use serde::{Deserialize, Serialize};

/// Summary of one orchestration pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassSummary {
  pub release_version: String,
  pub bump_type: BumpType,
  pub risk_level: RiskLevel,
  pub status: ReleaseStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub recommendation: Option<Recommendation>,
  pub blocking_issues: Vec<String>,
  pub warnings: Vec<String>,
  /// "YYYY-MM-DD HH:MM–HH:MM" for the primary window, when scheduled
  #[serde(skip_serializing_if = "Option::is_none")]
  pub window: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rollback_summary: Option<String>,
  /// Explicit reason for NO-GO/Blocked/unresolved outcomes
  #[serde(skip_serializing_if = "Option::is_none")]
  pub outcome_note: Option<String>,
}

/// Notification channel
pub trait Notifier: Send + Sync {
  fn notify(&self, summary: &PassSummary) -> RelayResult<()>;
}

/// Notifier that prints the summary to stdout
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
  fn notify(&self, summary: &PassSummary) -> RelayResult<()> {
    let icon = match summary.status {
      ReleaseStatus::Ready | ReleaseStatus::WindowScheduled => "✅",
      ReleaseStatus::Blocked => "🔴",
      _ => "📦",
    };

    println!();
    println!(
      "{} Release {} ({} bump, {} risk) — {}",
      icon, summary.release_version, summary.bump_type, summary.risk_level, summary.status
    );
    if let Some(recommendation) = summary.recommendation {
      println!("   Recommendation: {}", recommendation);
    }
    for issue in &summary.blocking_issues {
      println!("   🚫 {}", issue);
    }
    for warning in &summary.warnings {
      println!("   ⚠️  {}", warning);
    }
    if let Some(window) = &summary.window {
      println!("   🗓  Window: {}", window);
    }
    if let Some(rollback) = &summary.rollback_summary {
      println!("   ↩️  Rollback: {}", rollback);
    }
    if let Some(note) = &summary.outcome_note {
      println!("   {}", note);
    }

    Ok(())
  }
}

/// Notifier that discards summaries (JSON output mode keeps stdout clean)
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
  fn notify(&self, _summary: &PassSummary) -> RelayResult<()> {
    Ok(())
  }
}

/// Notifier that records summaries for assertions
#[derive(Default)]
pub struct RecordingNotifier {
  pub sent: std::sync::Mutex<Vec<PassSummary>>,
}

impl Notifier for RecordingNotifier {
  fn notify(&self, summary: &PassSummary) -> RelayResult<()> {
    self.sent.lock().expect("notifier lock").push(summary.clone());
    Ok(())
  }
}
