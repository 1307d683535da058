//! Release readiness gate
//!
//! A fixed catalog of named checks evaluated against release/context data,
//! aggregated into a blocking/non-blocking go/no-go recommendation.
//!
//! # Built-in Checks
//!
//! Blocking: **open-defects**, **tests-passing**, **staging-validated**,
//! **security-review**. Advisory: **changelog-generated**, **docs-updated**,
//! **approvals-complete**, **rollback-speed**.
//!
//! The blocking table is static and versioned with the catalog in
//! [`checks`]; it is never derived at runtime.

pub mod checks;
mod gate;
mod trait_def;

pub use gate::{GateReport, Recommendation, evaluate};
pub use trait_def::{CheckOutcome, CheckStatus, ReadinessCheck, ReadinessContext};
