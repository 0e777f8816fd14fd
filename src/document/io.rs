//! Loading and saving ady documents.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::document::model::Document;
use crate::error::{AdyError, Result};

/// Extension appended to the input stem when no output path is given.
pub const RESULT_EXTENSION: &str = ".result.ady";

/// Load an ady document from disk.
///
/// # Errors
/// * `NotFound` - If `path` is not a regular file
/// * `FileRead` - If the file cannot be read
/// * `Parse` - If the content is not a well-formed ady document
pub fn load(path: &Path) -> Result<Document> {
    if !path.is_file() {
        return Err(AdyError::NotFound {
            path: path.to_path_buf(),
        });
    }

    info!("Loading ady document: {}", path.display());

    let bytes = fs::read(path).map_err(|e| AdyError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let document = Document::from_slice(&bytes).map_err(|e| AdyError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    info!(
        "Loaded {} detected channels",
        document.detected_channels.len()
    );
    for command_id in document.duplicate_command_ids() {
        warn!(
            "commandId '{}' is used by several channels; exports will be refused",
            command_id
        );
    }

    Ok(document)
}

/// Save a document, overwriting `path`.
///
/// The write is not atomic. Callers that need the previous content must copy
/// it first.
pub fn save(document: &Document, path: &Path) -> Result<()> {
    let content = document.to_json_string(false)?;

    fs::write(path, content).map_err(|e| AdyError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("Output file written: {}", path.display());
    Ok(())
}

/// `<dir>/<stem>.result.ady` next to the input file.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}{}", stem, RESULT_EXTENSION))
}
