/*!
 * Error types for the dji-telemetry library.
 *
 * Container metadata problems are reported as [`FormatError`], failures of the
 * external ffmpeg/ffprobe tools as [`ToolError`]. [`AppError`] wraps both and is
 * what the extraction pipeline returns.
 */

use thiserror::Error;

/// Errors raised when required container metadata is missing or malformed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// A required probe field is absent
    #[error("Missing required metadata field: {0}")]
    MissingField(&'static str),

    /// The container duration is not a finite, non-negative number
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// The creation time is not a valid ISO-8601 timestamp
    #[error("Invalid creation time: {0}")]
    InvalidCreationTime(String),
}

/// Errors coming from the external media tools
#[derive(Error, Debug)]
pub enum ToolError {
    /// The tool binary could not be started
    #[error("Failed to execute {tool}: {source}")]
    Spawn {
        /// Name or path of the binary
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but exited unsuccessfully
    #[error("{tool} failed: {stderr}")]
    Failed {
        /// Name or path of the binary
        tool: String,
        /// Filtered stderr output
        stderr: String,
    },

    /// The tool produced output that could not be understood
    #[error("Invalid output from {tool}: {message}")]
    InvalidOutput {
        /// Name or path of the binary
        tool: String,
        /// What went wrong
        message: String,
    },

    /// Filesystem error around the transient subtitle file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Container metadata could not be normalized
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// An external tool failed
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
