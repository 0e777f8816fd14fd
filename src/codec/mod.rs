//! Text Codec Module
//!
//! Moves per-channel data between an ady document and REW-compatible text
//! files:
//! - Impulse responses and curve filters (export / import)
//! - Custom target curves (import from filter files)

pub mod header;
pub mod response;
pub mod target_curve;
pub mod text;

use std::path::PathBuf;

use crate::error::AdyError;

pub use header::{HeaderTemplate, REW_IMPULSE_HEADER};
pub use response::ResponseCodec;
pub use target_curve::{import_target_curve, parse_target_curve};

/// A file whose content was stored into a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    pub command_id: String,
    /// Position or curve label the data was stored under, if any.
    pub label: Option<String>,
    pub path: PathBuf,
    /// Number of data lines stored.
    pub value_count: usize,
}

/// A channel left untouched because its input file does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChannel {
    pub command_id: String,
    pub missing: PathBuf,
}

/// A channel (or one of its files) that failed without stopping the others.
#[derive(Debug)]
pub struct ChannelFailure {
    pub command_id: String,
    pub error: AdyError,
}

/// Outcome of a bulk import over every channel.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<ImportedFile>,
    pub skipped: Vec<SkippedChannel>,
    pub failures: Vec<ChannelFailure>,
}

impl ImportReport {
    /// Returns true if nothing failed. Skips are not failures.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Identifiers of channels that received data, without repeats.
    pub fn imported_channels(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for file in &self.imported {
            if !ids.contains(&file.command_id.as_str()) {
                ids.push(&file.command_id);
            }
        }
        ids
    }
}
