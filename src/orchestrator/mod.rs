//! Release orchestration
//!
//! Sequences the pipeline per release in fixed order: version resolution →
//! readiness gate → risk classification → {rollback plan, deployment
//! window, feature flags}. Each component consumes only the outputs of
//! earlier components; a retried pass resumes from the failed stage, which
//! is derivable from the release's status, instead of re-running completed
//! stages with stale inputs.
//!
//! The orchestrator exclusively owns status transitions. They happen under
//! the release's advisory lock and every persisted record is written
//! whole, so concurrent passes can never interleave a partial verdict.
//! A NO-GO hard-short-circuits the pass: no window is scheduled and no
//! flag work happens for that release. Every pass, successful or not,
//! emits exactly one notification.

use crate::core::config::RelayConfig;
use crate::core::error::{RelayError, RelayResult};
use crate::core::lock::ReleaseLocks;
use crate::flags::{FeatureFlag, FlagScanResult, normalize_flag_name, scan};
use crate::notify::{Notifier, PassSummary};
use crate::oracle::Oracle;
use crate::readiness::{GateReport, ReadinessContext, Recommendation, evaluate};
use crate::release::{ChangeSet, Release, ReleaseStatus, version};
use crate::risk;
use crate::rollback::{self, RollbackPlan};
use crate::schedule::{self, DeploymentWindow, ScheduleOutcome};
use crate::store::RecordStore;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{info, warn};

/// Inputs to one orchestration pass
#[derive(Debug, Clone)]
pub struct PassInput {
  pub changes: ChangeSet,
  pub current_version: semver::Version,
  pub pre_release: Option<String>,
  pub readiness: ReadinessContext,
  pub today: NaiveDate,
  pub now: DateTime<Utc>,
}

/// Composed result of one orchestration pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassResult {
  pub pass_id: String,
  pub release: Release,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub report: Option<GateReport>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub plan: Option<RollbackPlan>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub window: Option<DeploymentWindow>,
  pub flags_created: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub outcome_note: Option<String>,
}

/// The orchestration engine
pub struct Engine<'a> {
  config: &'a RelayConfig,
  store: &'a dyn RecordStore,
  oracle: &'a dyn Oracle,
  notifier: &'a dyn Notifier,
  locks: ReleaseLocks,
}

impl<'a> Engine<'a> {
  pub fn new(
    config: &'a RelayConfig,
    store: &'a dyn RecordStore,
    oracle: &'a dyn Oracle,
    notifier: &'a dyn Notifier,
  ) -> Self {
    Self {
      config,
      store,
      oracle,
      notifier,
      locks: ReleaseLocks::new(),
    }
  }

  fn timeout(&self) -> Duration {
    Duration::from_secs(self.config.oracle.timeout_secs)
  }

  /// Run one orchestration pass for a change set
  ///
  /// If a release for the resolved version already exists, the pass
  /// resumes from the stage its status encodes.
  pub fn orchestrate(&self, input: &PassInput) -> RelayResult<PassResult> {
    // Stage 1: version resolution (oracle failure falls back to rules)
    let resolution = version::resolve(
      &input.changes,
      &input.current_version,
      input.pre_release.as_deref(),
      self.oracle,
      self.timeout(),
    )?;

    let release_version = resolution.new_version.to_string();
    let guard = self.locks.acquire(&release_version);
    guard.with(|| {
      let release = match self.store.get_release(&release_version)? {
        Some(existing) => match existing.status {
          ReleaseStatus::Draft | ReleaseStatus::ReadinessEvaluated | ReleaseStatus::Ready => {
            info!(version = %release_version, status = %existing.status, "resuming orchestration pass");
            existing
          }
          status => {
            return Err(RelayError::invariant(format!(
              "release {} is already {} and cannot be re-orchestrated",
              release_version, status
            )));
          }
        },
        None => {
          let release = Release::new(&resolution, &input.changes, input.now);
          self.store.put_release(&release)?;
          release
        }
      };

      self.run_from_readiness(release, &input.readiness, input.today, input.now)
    })
  }

  /// Stages 2..6, entered with a Draft/ReadinessEvaluated/Ready release
  ///
  /// The change set comes from the release record itself, so a pass over
  /// several pending releases evaluates each against its own changes.
  fn run_from_readiness(
    &self,
    mut release: Release,
    readiness: &ReadinessContext,
    today: NaiveDate,
    now: DateTime<Utc>,
  ) -> RelayResult<PassResult> {
    let pass_id = pass_id(&release.version, now);
    let profile = release.change_set().profile();

    // A Ready release resumes at scheduling with its stored verdict
    if release.status == ReleaseStatus::Ready {
      let plan = self.store.get_plan(&release.version)?;
      return self.schedule_and_flags(release, None, plan, today, now, pass_id);
    }

    // Stage 2: readiness gate
    let mut readiness = readiness.clone();
    if readiness.rollback_below_target.is_none() {
      // Feed the prior plan's speed signal into this evaluation
      readiness.rollback_below_target = self
        .store
        .get_plan(&release.version)?
        .map(|p| p.below_target_speed);
    }

    let report = match evaluate(&release.version, &readiness, &profile, self.oracle, self.timeout()) {
      Ok(report) => report,
      Err(e) if e.is_infeasible() => {
        // No readiness data is an unresolved outcome, recorded, never silent
        release.transition(ReleaseStatus::ReadinessEvaluated)?;
        release.block(e.to_string())?;
        self.store.put_release(&release)?;
        let result = PassResult {
          pass_id,
          release,
          report: None,
          plan: None,
          window: None,
          flags_created: Vec::new(),
          outcome_note: Some(e.to_string()),
        };
        self.send_summary(&result);
        return Ok(result);
      }
      Err(e) => return Err(e),
    };

    release.transition(ReleaseStatus::ReadinessEvaluated)?;
    release.checks = report.checks.clone();

    // Stage 3: risk classification
    release.risk_level = risk::classify(&profile, release.bump_type, &report.signals(), report.advisory_tier);

    match report.recommendation {
      Recommendation::NoGo => {
        // Hard short-circuit: no window, no flag work
        release.block(report.blocking_issues.join("; "))?;
        self.store.put_release(&release)?;
        let result = PassResult {
          pass_id,
          release,
          report: Some(report),
          plan: None,
          window: None,
          flags_created: Vec::new(),
          outcome_note: Some("blocked by readiness gate".to_string()),
        };
        self.send_summary(&result);
        Ok(result)
      }
      Recommendation::ConditionalGo => {
        // Terminal advisory state pending an explicit resolve decision;
        // the rollback plan is still produced so its speed signal feeds
        // the next evaluation
        let plan = self.build_plan(&release, now);
        self.store.put_plan(&plan)?;
        self.store.put_release(&release)?;
        let result = PassResult {
          pass_id,
          release,
          report: Some(report),
          plan: Some(plan),
          window: None,
          flags_created: Vec::new(),
          outcome_note: Some("conditional go: awaiting explicit resolution".to_string()),
        };
        self.send_summary(&result);
        Ok(result)
      }
      Recommendation::Go => {
        release.transition(ReleaseStatus::Ready)?;
        let plan = self.build_plan(&release, now);
        self.store.put_plan(&plan)?;
        self.schedule_and_flags(release, Some(report), Some(plan), today, now, pass_id)
      }
    }
  }

  /// Stages 4..6 for a Ready release: rollback plan, window, flags
  fn schedule_and_flags(
    &self,
    mut release: Release,
    report: Option<GateReport>,
    plan: Option<RollbackPlan>,
    today: NaiveDate,
    now: DateTime<Utc>,
    pass_id: String,
  ) -> RelayResult<PassResult> {
    let plan = match plan {
      Some(plan) => plan,
      None => {
        let plan = self.build_plan(&release, now);
        self.store.put_plan(&plan)?;
        plan
      }
    };

    // Stage 5: deployment window
    let params = self.config.risk.params(release.risk_level);
    let outcome = schedule::propose(
      &release.version,
      release.risk_level,
      params,
      &self.config.scheduling,
      today,
      self.oracle,
      self.timeout(),
    );

    let (window, outcome_note) = match outcome {
      ScheduleOutcome::Scheduled(window) => {
        release.transition(ReleaseStatus::WindowScheduled)?;
        self.store.put_window(&window)?;
        (Some(window), None)
      }
      ScheduleOutcome::NoWindowFound { searched_days } => {
        // Explicit unresolved result; the release stays Ready
        let note = format!("no valid deployment window within {} days", searched_days);
        warn!(version = %release.version, note, "scheduling unresolved");
        (None, Some(note))
      }
    };

    // Stage 6: feature flags for flagged items (kill switches wired to
    // the rollback plan's breach triggers)
    let flagged: Vec<String> = release
      .changes
      .iter()
      .filter(|c| c.needs_feature_flag)
      .map(|c| normalize_flag_name(&c.description))
      .collect();
    let mut flags_created = Vec::new();
    for name in flagged {
      if self.store.get_flag(&name)?.is_none() {
        let flag = FeatureFlag::new(
          &name,
          &release.version,
          self.config.flags.default_phases.clone(),
          plan.triggers.clone(),
          now,
        )?;
        self.store.put_flag(&flag)?;
        flags_created.push(name);
      }
    }

    self.store.put_release(&release)?;

    let result = PassResult {
      pass_id,
      release,
      report,
      plan: Some(plan),
      window,
      flags_created,
      outcome_note,
    };
    self.send_summary(&result);
    Ok(result)
  }

  fn build_plan(&self, release: &Release, now: DateTime<Utc>) -> RollbackPlan {
    let profile = release.change_set().profile();
    let migrations: Vec<String> = release
      .changes
      .iter()
      .filter(|c| c.is_migration())
      .map(|c| c.description.clone())
      .collect();

    rollback::build(
      &release.version,
      &release.previous_version,
      release.risk_level,
      self.config.risk.params(release.risk_level),
      &profile,
      &migrations,
      self.oracle,
      self.timeout(),
      now,
    )
  }

  /// Resolve a CONDITIONAL-GO release with an explicit decision
  pub fn resolve_conditional(&self, version: &str, go: bool, reason: &str) -> RelayResult<Release> {
    let guard = self.locks.acquire(version);
    guard.with(|| {
      let mut release = self
        .store
        .get_release(version)?
        .ok_or_else(|| RelayError::message(format!("release '{}' not found", version)))?;

      if release.status != ReleaseStatus::ReadinessEvaluated {
        return Err(RelayError::invariant(format!(
          "release {} is {}, only readiness-evaluated releases can be resolved",
          version, release.status
        )));
      }

      if go {
        // A release with a failing blocking check can never become Ready
        if release
          .checks
          .iter()
          .any(|c| c.blocking && c.status == crate::readiness::CheckStatus::Fail)
        {
          return Err(RelayError::invariant(format!(
            "release {} has failing blocking checks and cannot be resolved to go",
            version
          )));
        }
        release.transition(ReleaseStatus::Ready)?;
      } else {
        release.block(reason)?;
      }

      self.store.put_release(&release)?;
      info!(version, go, reason, "conditional-go resolved");
      Ok(release)
    })
  }

  /// Record that the release was deployed in its window
  ///
  /// Enables the release's feature flags so the rollout clock starts.
  pub fn mark_deployed(&self, version: &str, now: DateTime<Utc>) -> RelayResult<Release> {
    let guard = self.locks.acquire(version);
    guard.with(|| {
      let mut release = self
        .store
        .get_release(version)?
        .ok_or_else(|| RelayError::message(format!("release '{}' not found", version)))?;
      release.transition(ReleaseStatus::Deployed)?;
      self.store.put_release(&release)?;

      for mut flag in self.store.list_flags()? {
        if flag.release_version == version && !flag.archived {
          flag.enable(now);
          self.store.put_flag(&flag)?;
        }
      }

      Ok(release)
    })
  }

  /// Record that the release was rolled back
  pub fn mark_rolled_back(&self, version: &str) -> RelayResult<Release> {
    let guard = self.locks.acquire(version);
    guard.with(|| {
      let mut release = self
        .store
        .get_release(version)?
        .ok_or_else(|| RelayError::message(format!("release '{}' not found", version)))?;
      release.transition(ReleaseStatus::RolledBack)?;
      self.store.put_release(&release)?;
      Ok(release)
    })
  }

  /// Periodic entry point: re-evaluate releases awaiting a verdict
  ///
  /// One pass (and one notification) per pending release, each replayed
  /// against its own stored change records.
  pub fn reevaluate_pending(
    &self,
    readiness: &ReadinessContext,
    today: NaiveDate,
    now: DateTime<Utc>,
  ) -> RelayResult<Vec<PassResult>> {
    let pending: Vec<Release> = self
      .store
      .list_releases()?
      .into_iter()
      .filter(|r| {
        matches!(
          r.status,
          ReleaseStatus::Draft | ReleaseStatus::ReadinessEvaluated | ReleaseStatus::Ready
        )
      })
      .collect();

    let mut results = Vec::new();
    for release in pending {
      let guard = self.locks.acquire(&release.version);
      let result = guard.with(|| self.run_from_readiness(release, readiness, today, now))?;
      results.push(result);
    }
    Ok(results)
  }

  /// Periodic entry point: scan flags for advancement and cleanup
  pub fn scan_flags(&self, now: DateTime<Utc>, active_conditions: &[String]) -> RelayResult<Vec<FlagScanResult>> {
    let flags: Vec<FeatureFlag> = self
      .store
      .list_flags()?
      .into_iter()
      .filter(|f| !f.archived)
      .collect();

    let results = scan(flags, now, active_conditions, self.config.flags.cleanup_aging_days);
    for result in &results {
      self.store.put_flag(&result.flag)?;
    }
    Ok(results)
  }

  /// Fire a kill switch on a flag by name
  pub fn kill_flag(&self, name: &str, reason: &str) -> RelayResult<FeatureFlag> {
    let mut flag = self
      .store
      .get_flag(name)?
      .ok_or_else(|| RelayError::message(format!("feature flag '{}' not found", name)))?;
    flag.kill(reason);
    self.store.put_flag(&flag)?;
    Ok(flag)
  }

  /// Archive a cleanup-eligible flag (the explicit destructive step)
  pub fn archive_flag(&self, name: &str, now: DateTime<Utc>) -> RelayResult<FeatureFlag> {
    let mut flag = self
      .store
      .get_flag(name)?
      .ok_or_else(|| RelayError::message(format!("feature flag '{}' not found", name)))?;

    if !flag.cleanup_eligible(now, self.config.flags.cleanup_aging_days) {
      return Err(RelayError::infeasible(format!(
        "flag '{}' is not cleanup-eligible (at {}%, aging window {} days)",
        name, flag.current_percentage, self.config.flags.cleanup_aging_days
      )));
    }

    flag.archived = true;
    self.store.put_flag(&flag)?;
    Ok(flag)
  }

  /// Exactly-one-notification rule; delivery failure is logged, never fatal
  fn send_summary(&self, result: &PassResult) {
    let summary = PassSummary {
      release_version: result.release.version.clone(),
      bump_type: result.release.bump_type,
      risk_level: result.release.risk_level,
      status: result.release.status,
      recommendation: result.report.as_ref().map(|r| r.recommendation),
      blocking_issues: result
        .report
        .as_ref()
        .map(|r| r.blocking_issues.clone())
        .unwrap_or_default(),
      warnings: result.report.as_ref().map(|r| r.warnings.clone()).unwrap_or_default(),
      window: result.window.as_ref().map(|w| {
        format!(
          "{} {}–{} (backup {})",
          w.primary.date, w.primary.start_time, w.primary.end_time, w.backup.date
        )
      }),
      rollback_summary: result.plan.as_ref().map(|p| p.summary()),
      outcome_note: result.outcome_note.clone(),
    };

    if let Err(e) = self.notifier.notify(&summary) {
      warn!(error = %e, version = %summary.release_version, "notification failed (ignored)");
    }
  }
}

/// Deterministic pass id from version and pass time
fn pass_id(version: &str, now: DateTime<Utc>) -> String {
  let mut hasher = Sha256::new();
  hasher.update(version.as_bytes());
  hasher.update(b"|");
  hasher.update(now.to_rfc3339().as_bytes());
  let digest = format!("{:x}", hasher.finalize());
  digest[..12].to_string()
}
