//! JSON file-backed record store
//!
//! Persists the full state document to `relay-state.json` next to
//! relay.toml. Every write rereads, applies one upsert, and rewrites the
//! document, so a retried write converges on the same stored state.

use crate::core::error::{RelayError, RelayResult};
use crate::flags::FeatureFlag;
use crate::release::Release;
use crate::rollback::RollbackPlan;
use crate::schedule::DeploymentWindow;
use crate::store::{RecordStore, StateDocument};
use std::fs;
use std::path::{Path, PathBuf};

const STATE_FILE: &str = "relay-state.json";

/// Record store persisting to a JSON state file
pub struct FileStore {
  path: PathBuf,
}

impl FileStore {
  /// Open (or lazily create) the store in a workspace directory
  pub fn open(workspace_root: &Path) -> Self {
    Self {
      path: workspace_root.join(STATE_FILE),
    }
  }

  fn load(&self) -> RelayResult<StateDocument> {
    if !self.path.exists() {
      return Ok(StateDocument::default());
    }
    let content = fs::read_to_string(&self.path)
      .map_err(|e| RelayError::Store(format!("failed to read {}: {}", self.path.display(), e)))?;
    serde_json::from_str(&content)
      .map_err(|e| RelayError::Store(format!("corrupt state file {}: {}", self.path.display(), e)))
  }

  fn save(&self, state: &StateDocument) -> RelayResult<()> {
    let content = serde_json::to_string_pretty(state)
      .map_err(|e| RelayError::Store(format!("failed to serialize state: {}", e)))?;
    fs::write(&self.path, content)
      .map_err(|e| RelayError::Store(format!("failed to write {}: {}", self.path.display(), e)))
  }

  fn update(&self, f: impl FnOnce(&mut StateDocument)) -> RelayResult<()> {
    let mut state = self.load()?;
    f(&mut state);
    self.save(&state)
  }
}

impl RecordStore for FileStore {
  fn get_release(&self, version: &str) -> RelayResult<Option<Release>> {
    Ok(self.load()?.releases.into_iter().find(|r| r.version == version))
  }

  fn put_release(&self, release: &Release) -> RelayResult<()> {
    self.update(|s| s.upsert_release(release.clone()))
  }

  fn list_releases(&self) -> RelayResult<Vec<Release>> {
    Ok(self.load()?.releases)
  }

  fn get_plan(&self, release_version: &str) -> RelayResult<Option<RollbackPlan>> {
    Ok(
      self
        .load()?
        .plans
        .into_iter()
        .find(|p| p.release_version == release_version),
    )
  }

  fn put_plan(&self, plan: &RollbackPlan) -> RelayResult<()> {
    self.update(|s| s.upsert_plan(plan.clone()))
  }

  fn get_window(&self, release_version: &str) -> RelayResult<Option<DeploymentWindow>> {
    Ok(
      self
        .load()?
        .windows
        .into_iter()
        .find(|w| w.release_version == release_version),
    )
  }

  fn put_window(&self, window: &DeploymentWindow) -> RelayResult<()> {
    self.update(|s| s.upsert_window(window.clone()))
  }

  fn get_flag(&self, name: &str) -> RelayResult<Option<FeatureFlag>> {
    Ok(self.load()?.flags.into_iter().find(|f| f.name == name))
  }

  fn put_flag(&self, flag: &FeatureFlag) -> RelayResult<()> {
    self.update(|s| s.upsert_flag(flag.clone()))
  }

  fn list_flags(&self) -> RelayResult<Vec<FeatureFlag>> {
    Ok(self.load()?.flags)
  }
}
