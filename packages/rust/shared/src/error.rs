//! Error types for qnasync.
//!
//! Library crates use [`SyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all qnasync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record set could not be read or decoded.
    #[error("failed to load {path:?}: {message}")]
    Load { path: PathBuf, message: String },

    /// A record set could not be encoded or written.
    #[error("failed to write {path:?}: {message}")]
    Write { path: PathBuf, message: String },

    /// The sheet is missing a column the reconciliation needs.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// A `QnaId` cell that is neither an integer nor a float.
    #[error("unparseable QnaId {value:?}")]
    UnparseableQnaId { value: String },

    /// Data validation error (bad boolean cell, unsupported extension, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a schema error from any displayable message.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn load(path: impl Into<PathBuf>, msg: impl std::fmt::Display) -> Self {
        Self::Load {
            path: path.into(),
            message: msg.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, msg: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.into(),
            message: msg.to_string(),
        }
    }
}
