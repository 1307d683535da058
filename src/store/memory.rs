//! In-memory record store for tests and dry runs

use crate::core::error::{RelayError, RelayResult};
use crate::flags::FeatureFlag;
use crate::release::Release;
use crate::rollback::RollbackPlan;
use crate::schedule::DeploymentWindow;
use crate::store::{RecordStore, StateDocument};
use std::sync::Mutex;

/// Record store backed by a mutex-guarded state document
#[derive(Default)]
pub struct MemoryStore {
  state: Mutex<StateDocument>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn with_state<T>(&self, f: impl FnOnce(&mut StateDocument) -> T) -> RelayResult<T> {
    let mut state = self
      .state
      .lock()
      .map_err(|_| RelayError::Store("state lock poisoned".to_string()))?;
    Ok(f(&mut state))
  }
}

impl RecordStore for MemoryStore {
  fn get_release(&self, version: &str) -> RelayResult<Option<Release>> {
    self.with_state(|s| s.releases.iter().find(|r| r.version == version).cloned())
  }

  fn put_release(&self, release: &Release) -> RelayResult<()> {
    self.with_state(|s| s.upsert_release(release.clone()))
  }

  fn list_releases(&self) -> RelayResult<Vec<Release>> {
    self.with_state(|s| s.releases.clone())
  }

  fn get_plan(&self, release_version: &str) -> RelayResult<Option<RollbackPlan>> {
    self.with_state(|s| s.plans.iter().find(|p| p.release_version == release_version).cloned())
  }

  fn put_plan(&self, plan: &RollbackPlan) -> RelayResult<()> {
    self.with_state(|s| s.upsert_plan(plan.clone()))
  }

  fn get_window(&self, release_version: &str) -> RelayResult<Option<DeploymentWindow>> {
    self.with_state(|s| {
      s.windows
        .iter()
        .find(|w| w.release_version == release_version)
        .cloned()
    })
  }

  fn put_window(&self, window: &DeploymentWindow) -> RelayResult<()> {
    self.with_state(|s| s.upsert_window(window.clone()))
  }

  fn get_flag(&self, name: &str) -> RelayResult<Option<FeatureFlag>> {
    self.with_state(|s| s.flags.iter().find(|f| f.name == name).cloned())
  }

  fn put_flag(&self, flag: &FeatureFlag) -> RelayResult<()> {
    self.with_state(|s| s.upsert_flag(flag.clone()))
  }

  fn list_flags(&self) -> RelayResult<Vec<FeatureFlag>> {
    self.with_state(|s| s.flags.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::release::{BumpType, ReleaseStatus};
  use crate::risk::RiskLevel;
  use chrono::Utc;

  fn release(version: &str) -> Release {
    Release {
      version: version.to_string(),
      previous_version: "1.0.0".to_string(),
      bump_type: BumpType::Minor,
      risk_level: RiskLevel::Medium,
      status: ReleaseStatus::Draft,
      total_changes: 1,
      created_at: Utc::now(),
      changes: Vec::new(),
      checks: Vec::new(),
      blocked_reason: None,
    }
  }

  #[test]
  fn test_put_get_roundtrip() {
    let store = MemoryStore::new();
    store.put_release(&release("1.1.0")).unwrap();
    let found = store.get_release("1.1.0").unwrap().unwrap();
    assert_eq!(found.version, "1.1.0");
    assert!(store.get_release("9.9.9").unwrap().is_none());
  }

  #[test]
  fn test_put_is_idempotent_upsert() {
    let store = MemoryStore::new();
    let mut rel = release("1.1.0");
    store.put_release(&rel).unwrap();
    store.put_release(&rel).unwrap();
    assert_eq!(store.list_releases().unwrap().len(), 1);

    rel.status = ReleaseStatus::ReadinessEvaluated;
    store.put_release(&rel).unwrap();
    let stored = store.get_release("1.1.0").unwrap().unwrap();
    assert_eq!(stored.status, ReleaseStatus::ReadinessEvaluated);
  }
}
