//! Error severity classification shared by the stemdir crates
//!
//! Crate-specific error enums implement [`Severity`] so callers can decide
//! whether a failure is a recoverable misuse of an API or a condition that
//! invalidates the structure being operated on.

/// Severity levels for error classification
///
/// - **Warning**: Potential issue but the operation can proceed.
/// - **Error**: The operation failed but the structure remains usable.
/// - **Critical**: The structure or its configuration cannot be trusted;
///   the caller should re-validate or rebuild it.
///
/// # Examples
///
/// ```rust
/// use stemdir_common::ErrorSeverity;
///
/// // Error: an index that does not exist is refused, nothing changed
/// let out_of_range = ErrorSeverity::Error;
///
/// // Critical: two rows share an order slot
/// let corruption = ErrorSeverity::Critical;
/// assert_ne!(out_of_range, corruption);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Potential issue but operation can proceed
    Warning,

    /// Operation failed but the structure can continue to be used
    ///
    /// # Examples
    /// - Duplicate item rejected
    /// - Index out of range
    /// - Navigating above the root
    Error,

    /// Structure or configuration cannot be trusted
    ///
    /// # Examples
    /// - Ordering invariant found violated in storage
    /// - Payload type that cannot be mapped to columns
    /// - Storage engine failure in the middle of a mutation
    Critical,
}

/// Trait for error types that have severity levels
///
/// # Example
///
/// ```rust
/// use stemdir_common::{ErrorSeverity, Severity};
///
/// #[derive(Debug)]
/// enum MyError {
///     Corrupted,
///     NotFound,
/// }
///
/// impl Severity for MyError {
///     fn severity(&self) -> ErrorSeverity {
///         match self {
///             MyError::Corrupted => ErrorSeverity::Critical,
///             MyError::NotFound => ErrorSeverity::Error,
///         }
///     }
/// }
///
/// assert_eq!(MyError::Corrupted.severity(), ErrorSeverity::Critical);
/// ```
pub trait Severity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;

    /// True when the caller must treat the structure as unusable
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}
