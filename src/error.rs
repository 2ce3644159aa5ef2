//! Error types for MBO → MBP reconstruction.
//!
//! Clean error handling using `thiserror` for ergonomic error definitions.

use thiserror::Error;

/// Result type alias for reconstruction operations.
pub type Result<T> = std::result::Result<T, MbpError>;

/// Main error type for reconstruction operations.
#[derive(Error, Debug, Clone)]
pub enum MbpError {
    /// Input event log is missing or unreadable
    #[error("Cannot open file: {path} ({reason})")]
    InputUnavailable { path: String, reason: String },

    /// Output file could not be created or written
    #[error("Cannot create output file {path} ({reason})")]
    OutputUnavailable { path: String, reason: String },

    /// I/O failure while streaming records
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration rejected before processing started
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Generic(String),
}

impl MbpError {
    /// Build an `InputUnavailable` error for `path`.
    pub fn input(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        MbpError::InputUnavailable {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Build an `OutputUnavailable` error for `path`.
    pub fn output(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        MbpError::OutputUnavailable {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for MbpError {
    fn from(err: std::io::Error) -> Self {
        MbpError::Io(err.to_string())
    }
}

impl From<csv::Error> for MbpError {
    fn from(err: csv::Error) -> Self {
        MbpError::Io(err.to_string())
    }
}

impl From<String> for MbpError {
    fn from(err: String) -> Self {
        MbpError::Generic(err)
    }
}

impl From<&str> for MbpError {
    fn from(err: &str) -> Self {
        MbpError::Generic(err.to_string())
    }
}
