//! Error types for tenderwatch.
//!
//! Library crates use [`TenderError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all tenderwatch operations.
#[derive(Debug, thiserror::Error)]
pub enum TenderError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The tender feed could not be opened as a local file or fetched remotely.
    #[error("source unavailable: {location}: {reason}")]
    SourceUnavailable { location: String, reason: String },

    /// Network/HTTP error outside of the primary source fetch.
    #[error("network error: {0}")]
    Network(String),

    /// CSV or JSON parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad run options, malformed output, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TenderError>;

impl TenderError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// The feed at `location` could not be read.
    pub fn source_unavailable(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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

    /// Whether this error aborts a pipeline run before any output is written.
    pub fn is_fatal_precondition(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::SourceUnavailable { .. })
    }
}
