//! Error handling for the ady engine
//!
//! Top-level failures (bad input path, unreadable document, bad directory)
//! are returned directly. Per-channel and per-file failures during bulk
//! imports and frequency export are collected into reports instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, AdyError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum AdyError {
    // Path Errors
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Failed to read file: {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Content Errors
    #[error("Invalid ady document {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Malformed line {line_number} in {path}: '{line}' (expected two values)")]
    Format {
        path: PathBuf,
        line_number: usize,
        line: String,
    },

    #[error("Unknown curve filter key: {key} (expected referenceCurveFilter or flatCurveFilter)")]
    InvalidKey { key: String },

    #[error("Sample {index} of {command_id} position {position} is not a number: '{token}'")]
    InvalidSample {
        command_id: String,
        position: String,
        index: usize,
        token: String,
    },

    #[error("Response {position} of {command_id} contains no samples")]
    EmptyResponse { command_id: String, position: String },

    #[error("Duplicate commandId '{command_id}': exported files would overwrite each other")]
    DuplicateCommandId { command_id: String },

    #[error("Channel {command_id}: '{name}' cannot be used in a file name ({reason})")]
    InvalidName {
        command_id: String,
        name: String,
        reason: &'static str,
    },

    // Serialization Errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AdyError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AdyError::NotFound { .. } => "NOT_FOUND",
            AdyError::NotADirectory { .. } => "NOT_A_DIRECTORY",
            AdyError::FileRead { .. } => "FILE_READ_ERROR",
            AdyError::FileWrite { .. } => "FILE_WRITE_ERROR",
            AdyError::Parse { .. } => "PARSE_ERROR",
            AdyError::Format { .. } => "FORMAT_ERROR",
            AdyError::InvalidKey { .. } => "INVALID_KEY",
            AdyError::InvalidSample { .. } => "INVALID_SAMPLE",
            AdyError::EmptyResponse { .. } => "EMPTY_RESPONSE",
            AdyError::DuplicateCommandId { .. } => "DUPLICATE_COMMAND_ID",
            AdyError::InvalidName { .. } => "INVALID_NAME",
            AdyError::Json(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Returns a user-facing recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            AdyError::NotFound { .. } => Some("Check the file path and try again."),
            AdyError::NotADirectory { .. } => {
                Some("Pass an existing directory; files are not created inside missing folders.")
            }
            AdyError::FileWrite { .. } => {
                Some("Check that the destination is writable and has free space.")
            }
            AdyError::Parse { .. } => {
                Some("Make sure the file is an ady export with a detectedChannels array.")
            }
            AdyError::Format { .. } => Some(
                "Each filter line must hold a frequency and a gain separated by spaces or a tab.",
            ),
            AdyError::InvalidKey { .. } => Some("Use referenceCurveFilter or flatCurveFilter."),
            AdyError::DuplicateCommandId { .. } => {
                Some("Give every detected channel a distinct commandId before exporting.")
            }
            AdyError::InvalidName { .. } => {
                Some("Rename the channel or label in the ady file before exporting.")
            }
            _ => None,
        }
    }
}
