//! Error types for release-relay
//!
//! The taxonomy follows the engine's failure policy:
//! - external-dependency failures (`Oracle`, `Store`) are caught at the
//!   component boundary and converted to documented fallbacks; they only
//!   surface here when no fallback exists (e.g. the state file is corrupt)
//! - infeasibility (`Infeasible`) is an explicit non-success outcome, not a
//!   silent default
//! - invariant violations (`Invariant`) indicate a caller/logic bug and are
//!   rejected at the API boundary

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type RelayResult<T> = Result<T, RelayError>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum RelayError {
  /// Configuration problems (missing relay.toml, invalid tables)
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// Record store failure with no fallback (corrupt state file, io)
  #[error("record store error: {0}")]
  Store(String),

  /// Assessment oracle failure that escaped a fallback boundary
  #[error("assessment oracle error: {0}")]
  Oracle(String),

  /// Constraint infeasibility: a valid result does not exist
  /// (e.g. no deployment window inside the look-ahead, no readiness data)
  #[error("unresolved: {0}")]
  Infeasible(String),

  /// Invariant violation: the requested operation is a logic bug
  /// (e.g. backward status transition)
  #[error("invariant violation: {0}")]
  Invariant(String),

  /// Generic error with message and optional help text
  #[error("{message}")]
  Message {
    message: String,
    help: Option<String>,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("relay.toml not found in {}", workspace_root.display())]
  NotFound { workspace_root: PathBuf },

  #[error("invalid configuration: {0}")]
  Invalid(String),

  #[error("failed to parse relay.toml: {0}")]
  Parse(String),
}

impl RelayError {
  /// Create a generic error from a message
  pub fn message(message: impl Into<String>) -> Self {
    RelayError::Message {
      message: message.into(),
      help: None,
    }
  }

  /// Create a generic error with a help suggestion
  pub fn with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
    RelayError::Message {
      message: message.into(),
      help: Some(help.into()),
    }
  }

  /// Create an infeasibility error
  pub fn infeasible(reason: impl Into<String>) -> Self {
    RelayError::Infeasible(reason.into())
  }

  /// Create an invariant-violation error
  pub fn invariant(reason: impl Into<String>) -> Self {
    RelayError::Invariant(reason.into())
  }

  /// Whether this error is an explicit infeasibility (unresolved result)
  /// rather than a hard failure
  pub fn is_infeasible(&self) -> bool {
    matches!(self, RelayError::Infeasible(_))
  }

  /// Process exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RelayError::Config(_) => ExitCode::Config,
      RelayError::Infeasible(_) => ExitCode::Unresolved,
      RelayError::Invariant(_) => ExitCode::Invariant,
      _ => ExitCode::Failure,
    }
  }
}

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  Success,
  Failure,
  Config,
  Unresolved,
  Invariant,
}

impl ExitCode {
  pub fn as_i32(self) -> i32 {
    match self {
      ExitCode::Success => 0,
      ExitCode::Failure => 1,
      ExitCode::Config => 2,
      ExitCode::Unresolved => 3,
      ExitCode::Invariant => 4,
    }
  }
}

/// Print an error to stderr with its help text (if any)
pub fn print_error(err: &RelayError) {
  eprintln!("❌ Error: {}", err);
  if let RelayError::Message { help: Some(help), .. } = err {
    eprintln!();
    eprintln!("💡 {}", help);
  }
}

/// Extension trait for attaching context to results
pub trait ResultExt<T> {
  /// Wrap the error with a context message
  fn with_context<F>(self, f: F) -> RelayResult<T>
  where
    F: FnOnce() -> String;

  /// Wrap the error with a static context message
  fn context(self, msg: &str) -> RelayResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
  fn with_context<F>(self, f: F) -> RelayResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| RelayError::message(format!("{}: {}", f(), e)))
  }

  fn context(self, msg: &str) -> RelayResult<T> {
    self.map_err(|e| RelayError::message(format!("{}: {}", msg, e)))
  }
}
