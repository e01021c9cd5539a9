//! Error types for directory operations

use crate::schema::FieldKind;
use stemdir_common::{ErrorSeverity, Severity};
use thiserror::Error;

/// Result type alias using DirError.
pub type Result<T> = std::result::Result<T, DirError>;

/// Errors that can occur while building or operating on a directory.
#[derive(Debug, Error)]
pub enum DirError {
    /// An equal item already exists in the current directory.
    #[error("cannot add '{name}': an equal item already exists in this directory")]
    DuplicateItem { name: String },

    /// No item exists at the requested index.
    #[error("no item exists at index {index} (directory holds {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// Operation is not valid for the current cursor position.
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    /// No equal item exists in the current directory.
    #[error("item not found in the current directory")]
    ItemNotFound,

    /// No entry with this name exists in the current directory.
    #[error("no entry named '{name}' in the current directory")]
    NameNotFound { name: String },

    /// Payload field kind has no column mapping.
    #[error("field '{field}' has kind {kind} which has no column mapping")]
    UnsupportedFieldType { field: String, kind: FieldKind },

    /// Payload type declares no fields.
    #[error("type '{type_name}' declares no mapped fields")]
    NoMappedFields { type_name: &'static str },

    /// Payload type declares the same field twice.
    #[error("field '{field}' is declared more than once")]
    DuplicateField { field: String },

    /// Storage holds rows that violate the directory invariants.
    #[error("corrupt directory state: '{predicate}' matched {rows} rows")]
    CorruptState { predicate: String, rows: usize },

    /// Operation is not supported by this engine.
    #[error("{operation} is not supported by this directory engine")]
    Unsupported { operation: &'static str },

    /// Store configuration is invalid.
    #[error("invalid store configuration: {message}")]
    Config { message: String },

    /// Store configuration could not be extracted.
    #[error("failed to load store configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DirError {
    /// Create an InvalidOperation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Create a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for DirError {
    fn from(error: figment::Error) -> Self {
        Self::Figment(Box::new(error))
    }
}

impl Severity for DirError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            // Structure or setup cannot be trusted
            DirError::CorruptState { .. } => ErrorSeverity::Critical,
            DirError::UnsupportedFieldType { .. } => ErrorSeverity::Critical,
            DirError::NoMappedFields { .. } => ErrorSeverity::Critical,
            DirError::DuplicateField { .. } => ErrorSeverity::Critical,
            DirError::Config { .. } => ErrorSeverity::Critical,
            DirError::Figment(_) => ErrorSeverity::Critical,
            DirError::Sqlite(_) => ErrorSeverity::Critical,
            DirError::Io(_) => ErrorSeverity::Critical,

            // Refused, nothing changed
            DirError::DuplicateItem { .. } => ErrorSeverity::Error,
            DirError::IndexOutOfRange { .. } => ErrorSeverity::Error,
            DirError::InvalidOperation { .. } => ErrorSeverity::Error,
            DirError::ItemNotFound => ErrorSeverity::Error,
            DirError::NameNotFound { .. } => ErrorSeverity::Error,
            DirError::Unsupported { .. } => ErrorSeverity::Error,
        }
    }
}
