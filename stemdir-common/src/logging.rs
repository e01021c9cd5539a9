//! Logging utilities for stemdir
//!
//! This module provides utilities for formatting values in log messages.

use serde::Serialize;
use std::fmt::Debug;

/// Wrapper for pretty-printing types in logs as YAML
///
/// Use this in tracing statements to format configuration and other
/// structured values with a newline before the content:
///
/// ```
/// use stemdir_common::Pretty;
///
/// #[derive(Debug, serde::Serialize)]
/// struct Store {
///     table_prefix: String,
/// }
///
/// let store = Store { table_prefix: "Task".into() };
/// assert!(format!("{}", Pretty(&store)).contains("table_prefix: Task"));
/// ```
///
/// Debug is used as a fallback if YAML serialization fails.
pub struct Pretty<T>(pub T);

impl<T: Serialize + Debug> std::fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_yaml_ng::to_string(&self.0) {
            Ok(yaml) => write!(f, "\n{}", yaml),
            Err(_) => write!(f, "\n{:#?}", self.0),
        }
    }
}

impl<T: Serialize + Debug> std::fmt::Debug for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}
