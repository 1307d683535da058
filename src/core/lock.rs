//! Per-release advisory exclusion
//!
//! Two concurrent readiness evaluations racing on the same release could
//! interleave a blocking/non-blocking verdict. The orchestrator takes the
//! release's advisory lock before any status transition so the last writer
//! always writes the full aggregated result at once. Locks are keyed by
//! release version; distinct releases never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Registry of per-release advisory locks
#[derive(Default)]
pub struct ReleaseLocks {
  locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Guard holding one release's advisory lock
pub struct ReleaseGuard {
  lock: Arc<Mutex<()>>,
}

impl ReleaseLocks {
  pub fn new() -> Self {
    Self::default()
  }

  /// Acquire the advisory lock for a release version, blocking until free
  pub fn acquire(&self, version: &str) -> ReleaseGuard {
    let lock = {
      let mut locks = self.locks.lock().expect("lock registry poisoned");
      locks.entry(version.to_string()).or_default().clone()
    };
    ReleaseGuard { lock }
  }
}

impl ReleaseGuard {
  /// Hold the lock for the duration of `f`
  pub fn with<T>(&self, f: impl FnOnce() -> T) -> T {
    let _held: MutexGuard<'_, ()> = self.lock.lock().expect("release lock poisoned");
    f()
  }
}
