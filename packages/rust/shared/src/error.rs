//! Error types for Luma.
//!
//! Library crates use [`LumaError`] via `thiserror`.
//! The server binary wraps startup failures with `color-eyre` for rich
//! diagnostics; request-path errors stay typed all the way to the HTTP layer.

use std::path::PathBuf;

/// Top-level error type for all Luma operations.
#[derive(Debug, thiserror::Error)]
pub enum LumaError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Request validation error (missing or empty url).
    ///
    /// The `message` field is what the HTTP layer returns verbatim in the
    /// 400 body, so it must stand on its own without the display prefix.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Browser-session acquisition or teardown error.
    #[error("browser session error: {0}")]
    Session(String),

    /// Audit engine error (spawn, timeout, non-zero exit, unreadable report).
    #[error("audit error: {0}")]
    Audit(String),

    /// Malformed audit report (missing mandatory category).
    #[error("aggregation error: {message}")]
    Aggregation { message: String },

    /// Text-completion call error (network, API status, response shape).
    #[error("completion error: {0}")]
    Completion(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LumaError>;

impl LumaError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an aggregation error from any displayable message.
    pub fn aggregation(msg: impl Into<String>) -> Self {
        Self::Aggregation {
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
}
