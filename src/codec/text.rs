//! Plain-text conventions shared by every importer.
//!
//! - Files are ISO-8859-1: every byte is one character
//! - Blank lines, `*` comment lines and lines holding a `//` comment carry no data
//! - Per-channel files are named `<label>_<commandId>.txt`

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use walkdir::WalkDir;

use crate::error::{AdyError, Result};

/// Extension of every text file read or written by the codec.
pub const TEXT_EXTENSION: &str = ".txt";

/// Comment prefix understood by REW.
pub const COMMENT_PREFIX: char = '*';

/// Marker of an inline comment (`16384 // Response length`).
pub const INLINE_COMMENT: &str = "//";

/// Minimum length of a curve-filter label in a file name.
pub const CURVE_LABEL_MIN_LEN: usize = 9;

/// Which labels a per-channel file name may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRule {
    /// Measurement position: ASCII digits (`0_FL.txt`).
    Position,
    /// Curve-filter label: an alphanumeric word of at least
    /// [`CURVE_LABEL_MIN_LEN`] characters (`dispersion_FL.txt`).
    CurveLabel,
}

impl LabelRule {
    fn describe(&self) -> &'static str {
        match self {
            LabelRule::Position => "position labels must be ASCII digits",
            LabelRule::CurveLabel => {
                "curve labels must be at least 9 ASCII letters or digits"
            }
        }
    }

    pub fn accepts(&self, label: &str) -> bool {
        match self {
            LabelRule::Position => !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit()),
            LabelRule::CurveLabel => {
                label.len() >= CURVE_LABEL_MIN_LEN
                    && label.bytes().all(|b| b.is_ascii_alphanumeric())
            }
        }
    }
}

/// Decode ISO-8859-1 bytes.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Read a text file as ISO-8859-1.
pub fn read_latin1(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| AdyError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(decode_latin1(&bytes))
}

/// Returns true if the line carries no data.
pub fn is_ignored_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) || line.contains(INLINE_COMMENT)
}

/// Data lines of a file with their 1-based line numbers, trailing
/// whitespace removed.
pub fn data_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !is_ignored_line(line))
        .map(|(index, line)| (index + 1, line.trim_end()))
}

/// `<label>_<command_id>.txt`
pub fn label_file_name(label: &str, command_id: &str) -> String {
    format!("{}_{}{}", label, command_id, TEXT_EXTENSION)
}

/// Fail unless `command_id` can be used as a file name fragment.
pub fn check_command_id(command_id: &str) -> Result<()> {
    let reason = if command_id.is_empty() {
        "commandId is empty"
    } else if command_id.contains(['/', '\\', '\0']) {
        "commandId contains a path separator"
    } else if command_id == "." || command_id == ".." {
        "commandId is a relative path"
    } else {
        return Ok(());
    };

    Err(AdyError::InvalidName {
        command_id: command_id.to_string(),
        name: command_id.to_string(),
        reason,
    })
}

/// Fail unless every file `<label>_<command_id>.txt` written for `data` could
/// be matched again by an import using `rule`.
pub fn check_file_names<V>(
    command_id: &str,
    data: &IndexMap<String, V>,
    rule: LabelRule,
) -> Result<()> {
    check_command_id(command_id)?;

    match data.keys().find(|label| !rule.accepts(label)) {
        Some(label) => Err(AdyError::InvalidName {
            command_id: command_id.to_string(),
            name: label.clone(),
            reason: rule.describe(),
        }),
        None => Ok(()),
    }
}

/// Extract the label from a per-channel file name, if the name belongs to
/// `command_id` and the label satisfies `rule`.
pub fn match_label_file<'a>(
    file_name: &'a str,
    command_id: &str,
    rule: LabelRule,
) -> Option<&'a str> {
    let label = file_name
        .strip_suffix(TEXT_EXTENSION)?
        .strip_suffix(command_id)?
        .strip_suffix('_')?;

    rule.accepts(label).then_some(label)
}

/// Fail unless `path` is an existing directory.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else if path.exists() {
        Err(AdyError::NotADirectory {
            path: path.to_path_buf(),
        })
    } else {
        Err(AdyError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Text files directly inside `dir`, sorted by name.
pub fn list_text_files(dir: &Path) -> Result<Vec<PathBuf>> {
    ensure_directory(dir)?;

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .ends_with(TEXT_EXTENSION)
        })
        .map(|entry| entry.path().to_path_buf())
        .collect();

    files.sort();
    Ok(files)
}
