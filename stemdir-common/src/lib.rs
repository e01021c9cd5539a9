//! # stemdir common
//!
//! Foundational pieces shared by the stemdir crates:
//!
//! - [`error`] - severity classification for error types
//! - [`logging`] - formatting helpers for `tracing` output

pub mod error;
pub mod logging;

pub use error::{ErrorSeverity, Severity};
pub use logging::Pretty;
