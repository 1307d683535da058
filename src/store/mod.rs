//! Record store abstraction
//!
//! CRUD keyed by entity id (release version, flag name). The engine never
//! assumes transactional multi-entity writes: each upsert is independent
//! and idempotent, so a retried pass rewrites the same records to the same
//! stored state. Components return plain data; only the orchestrator
//! persists, keeping decision logic free of I/O.

mod file;
#[cfg(test)]
mod memory;

pub use file::FileStore;
#[cfg(test)]
pub use memory::MemoryStore;

use crate::core::error::RelayResult;
use crate::flags::FeatureFlag;
use crate::release::Release;
use crate::rollback::RollbackPlan;
use crate::schedule::DeploymentWindow;
use serde::{Deserialize, Serialize};

/// Everything the engine persists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateDocument {
  #[serde(default)]
  pub releases: Vec<Release>,
  #[serde(default)]
  pub plans: Vec<RollbackPlan>,
  #[serde(default)]
  pub windows: Vec<DeploymentWindow>,
  #[serde(default)]
  pub flags: Vec<FeatureFlag>,
}

impl StateDocument {
  /// Insert or replace by key; same id + same payload → same stored state
  pub fn upsert_release(&mut self, release: Release) {
    match self.releases.iter_mut().find(|r| r.version == release.version) {
      Some(existing) => *existing = release,
      None => self.releases.push(release),
    }
  }

  pub fn upsert_plan(&mut self, plan: RollbackPlan) {
    match self
      .plans
      .iter_mut()
      .find(|p| p.release_version == plan.release_version)
    {
      Some(existing) => *existing = plan,
      None => self.plans.push(plan),
    }
  }

  pub fn upsert_window(&mut self, window: DeploymentWindow) {
    match self
      .windows
      .iter_mut()
      .find(|w| w.release_version == window.release_version)
    {
      Some(existing) => *existing = window,
      None => self.windows.push(window),
    }
  }

  pub fn upsert_flag(&mut self, flag: FeatureFlag) {
    match self.flags.iter_mut().find(|f| f.name == flag.name) {
      Some(existing) => *existing = flag,
      None => self.flags.push(flag),
    }
  }
}

/// Store of releases, plans, windows, and flags
///
/// Calls are blocking; implementations are expected to fail fast rather
/// than hang (the engine treats store errors as fatal for the current
/// invocation, unlike oracle errors).
pub trait RecordStore: Send + Sync {
  fn get_release(&self, version: &str) -> RelayResult<Option<Release>>;
  fn put_release(&self, release: &Release) -> RelayResult<()>;
  fn list_releases(&self) -> RelayResult<Vec<Release>>;

  fn get_plan(&self, release_version: &str) -> RelayResult<Option<RollbackPlan>>;
  fn put_plan(&self, plan: &RollbackPlan) -> RelayResult<()>;

  fn get_window(&self, release_version: &str) -> RelayResult<Option<DeploymentWindow>>;
  fn put_window(&self, window: &DeploymentWindow) -> RelayResult<()>;

  fn get_flag(&self, name: &str) -> RelayResult<Option<FeatureFlag>>;
  fn put_flag(&self, flag: &FeatureFlag) -> RelayResult<()>;
  fn list_flags(&self) -> RelayResult<Vec<FeatureFlag>>;
}
