//! Core infrastructure: configuration, errors, per-release locking

pub mod config;
pub mod error;
pub mod lock;
