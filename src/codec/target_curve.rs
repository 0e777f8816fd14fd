//! Custom target curve import
//!
//! A filter directory holds one `<commandId>.txt` per channel, each data line
//! being `<frequency> <gain>` separated by spaces or tabs. The points replace
//! the channel's `customTargetCurvePoints`, tokens copied as written.

use std::path::Path;

use log::{info, warn};

use crate::codec::text::{
    check_command_id, data_lines, ensure_directory, read_latin1, TEXT_EXTENSION,
};
use crate::codec::{ChannelFailure, ImportReport, ImportedFile, SkippedChannel};
use crate::document::{Document, TargetCurvePoint};
use crate::error::{AdyError, Result};

/// Parse the content of a target curve file.
///
/// `path` is only used for error reporting.
///
/// # Errors
/// * `Format` - If a data line does not split into exactly two tokens
pub fn parse_target_curve(content: &str, path: &Path) -> Result<Vec<TargetCurvePoint>> {
    data_lines(content)
        .map(|(line_number, line)| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                [frequency, gain] => Ok(TargetCurvePoint::from_tokens(frequency, gain)),
                _ => Err(AdyError::Format {
                    path: path.to_path_buf(),
                    line_number,
                    line: line.to_string(),
                }),
            }
        })
        .collect()
}

/// Replace every channel's target curve with `<filter_dir>/<commandId>.txt`.
///
/// Channels without a file are skipped and keep their current points. A
/// malformed file leaves its channel unchanged and is recorded in the report;
/// the other channels are still processed.
///
/// # Errors
/// * `NotFound` / `NotADirectory` - If `filter_dir` is not a directory
pub fn import_target_curve(document: &mut Document, filter_dir: &Path) -> Result<ImportReport> {
    ensure_directory(filter_dir)?;

    info!("Injecting filters from {}...", filter_dir.display());

    let mut report = ImportReport::default();

    for channel in &mut document.detected_channels {
        if let Err(e) = check_command_id(&channel.command_id) {
            warn!("{} not imported: {}", channel.command_id, e);
            report.failures.push(ChannelFailure {
                command_id: channel.command_id.clone(),
                error: e,
            });
            continue;
        }

        let path = filter_dir.join(format!("{}{}", channel.command_id, TEXT_EXTENSION));

        if !path.is_file() {
            warn!(
                "cannot access '{}': No such file, skipping {}",
                path.display(),
                channel.command_id
            );
            report.skipped.push(SkippedChannel {
                command_id: channel.command_id.clone(),
                missing: path,
            });
            continue;
        }

        let parsed = read_latin1(&path).and_then(|content| parse_target_curve(&content, &path));
        match parsed {
            Ok(points) => {
                info!("{} imported successfully ({} points)", channel.command_id, points.len());
                report.imported.push(ImportedFile {
                    command_id: channel.command_id.clone(),
                    label: None,
                    path,
                    value_count: points.len(),
                });
                channel.custom_target_curve_points = Some(points);
            }
            Err(e) => {
                warn!("{} not imported: {}", channel.command_id, e);
                report.failures.push(ChannelFailure {
                    command_id: channel.command_id.clone(),
                    error: e,
                });
            }
        }
    }

    info!(
        "Injecting filters done: {} imported, {} skipped, {} failed",
        report.imported.len(),
        report.skipped.len(),
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Channel;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn points(channel: &Channel) -> Vec<String> {
        channel
            .custom_target_curve_points
            .as_ref()
            .map(|points| points.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_parse_spaces_and_tabs() {
        let content = "* REW filter export\n\n20 -3\n100\t1.5\n  1000   0 \n";
        let parsed = parse_target_curve(content, Path::new("C.txt")).unwrap();
        let text: Vec<String> = parsed.iter().map(ToString::to_string).collect();
        assert_eq!(text, vec!["{20, -3}", "{100, 1.5}", "{1000, 0}"]);
    }

    #[test]
    fn test_parse_rejects_wrong_column_count() {
        let result = parse_target_curve("20 -3\n40 -2 7\n", Path::new("C.txt"));
        match result {
            Err(AdyError::Format {
                line_number, line, ..
            }) => {
                assert_eq!(line_number, 2);
                assert_eq!(line, "40 -2 7");
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_copies_tokens_as_written() {
        let parsed = parse_target_curve("20.000 -3.00\n1e3 0.5\n", Path::new("C.txt")).unwrap();
        let text: Vec<String> = parsed.iter().map(ToString::to_string).collect();
        assert_eq!(text, vec!["{20.000, -3.00}", "{1e3, 0.5}"]);
        assert_eq!(parsed[1].frequency_hz(), Some(1000.0));
    }

    #[test]
    fn test_parse_keeps_non_numeric_pairs() {
        let parsed = parse_target_curve("Freq Gain\n", Path::new("C.txt")).unwrap();
        assert_eq!(parsed[0].text(), "{Freq, Gain}");
        assert_eq!(parsed[0].frequency_hz(), None);

        let result = parse_target_curve("Freq(Hz)\n", Path::new("C.txt"));
        assert!(matches!(result, Err(AdyError::Format { line_number: 1, .. })));
    }

    #[test]
    fn test_command_id_with_path_is_not_read() {
        let temp = tempdir().unwrap();
        let filter_dir = temp.path().join("filter");
        fs::create_dir(&filter_dir).unwrap();
        fs::write(temp.path().join("secret.txt"), "20 -3\n").unwrap();

        let mut document = Document::new(vec![Channel::new("../secret"), Channel::new("C")]);
        let report = import_target_curve(&mut document, &filter_dir).unwrap();

        assert!(document.detected_channels[0].custom_target_curve_points.is_none());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].command_id, "../secret");
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_import_sets_points() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("C1.txt"), "20 -3\n").unwrap();

        let mut document = Document::new(vec![Channel::new("C1")]);
        let report = import_target_curve(&mut document, temp.path()).unwrap();

        assert_eq!(points(&document.detected_channels[0]), vec!["{20, -3}"]);
        assert_eq!(report.imported.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_missing_file_skips_channel_only() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("FL.txt"), "20 1\n").unwrap();

        let mut c1 = Channel::new("C1");
        c1.custom_target_curve_points = Some(vec![TargetCurvePoint::new(50.0, 2.0)]);
        let mut document = Document::new(vec![c1, Channel::new("FL")]);

        let report = import_target_curve(&mut document, temp.path()).unwrap();

        assert_eq!(points(&document.detected_channels[0]), vec!["{50, 2}"]);
        assert_eq!(points(&document.detected_channels[1]), vec!["{20, 1}"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].command_id, "C1");
        assert_eq!(report.skipped[0].missing, temp.path().join("C1.txt"));
    }

    #[test]
    fn test_malformed_file_fails_channel_only() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("C.txt"), "20\n").unwrap();
        fs::write(temp.path().join("FR.txt"), "20 4\n").unwrap();

        let mut c = Channel::new("C");
        c.custom_target_curve_points = Some(vec![TargetCurvePoint::new(10.0, 0.0)]);
        let mut document = Document::new(vec![c, Channel::new("FR")]);

        let report = import_target_curve(&mut document, temp.path()).unwrap();

        assert_eq!(points(&document.detected_channels[0]), vec!["{10, 0}"]);
        assert_eq!(points(&document.detected_channels[1]), vec!["{20, 4}"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].command_id, "C");
        assert!(!report.is_clean());
    }

    #[test]
    fn test_filter_dir_must_exist() {
        let temp = tempdir().unwrap();
        let mut document = Document::new(vec![Channel::new("C")]);
        let result = import_target_curve(&mut document, &temp.path().join("filter"));
        assert!(matches!(result, Err(AdyError::NotFound { .. })));
    }

    #[test]
    fn test_latin1_comment_is_accepted() {
        let temp = tempdir().unwrap();
        let mut bytes = b"* gain in dB, 20\xB0C\n".to_vec();
        bytes.extend_from_slice(b"20 -3\n");
        fs::write(temp.path().join("C.txt"), bytes).unwrap();

        let mut document = Document::new(vec![Channel::new("C")]);
        let report = import_target_curve(&mut document, temp.path()).unwrap();

        assert!(report.is_clean());
        assert_eq!(points(&document.detected_channels[0]), vec!["{20, -3}"]);
    }
}
