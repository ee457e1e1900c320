//! Error types for RAID status collection

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for RAID status operations
pub type Result<T> = std::result::Result<T, RaidError>;

/// Errors produced while querying a controller utility and parsing its reports
#[derive(Error, Debug)]
pub enum RaidError {
    /// The controller utility could not be started or exited non-zero
    #[error("Invocation error: {command} {args}: {source}")]
    Invocation {
        command: String,
        args: String,
        #[source]
        source: io::Error,
    },

    /// The report does not carry the expected structure (exit marker missing)
    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    /// The report body is empty
    #[error("Empty report: {0}")]
    EmptyReport(String),

    /// The utility ran and reported its own failure code
    #[error("Command failed with controller code {0}")]
    CommandFailed(String),

    /// A `Label: value` line without a colon separator
    #[error("Malformed line: {0:?}")]
    MalformedLine(String),

    /// A value that does not convert to the requested kind
    #[error("Malformed field in {line:?}: {reason}")]
    MalformedField { line: String, reason: String },

    /// The configured controller utility does not exist
    #[error("Controller utility not found: {}", .0.display())]
    UtilityNotFound(PathBuf),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A report pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RaidError {
    /// True for single-line coercion failures, the only errors the lenient
    /// line policy may skip.
    pub fn is_line_error(&self) -> bool {
        matches!(
            self,
            RaidError::MalformedLine(_) | RaidError::MalformedField { .. }
        )
    }
}
