//! Impulse response and curve filter files
//!
//! Export writes one `<label>_<commandId>.txt` file per channel and label,
//! REW header first. Import scans a directory for the same names and stores
//! the data lines back into the document.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::codec::header::HeaderTemplate;
use crate::codec::text::{
    check_file_names, data_lines, ensure_directory, label_file_name, list_text_files,
    match_label_file, read_latin1, LabelRule,
};
use crate::codec::{ChannelFailure, ImportReport, ImportedFile};
use crate::document::{CurveFilter, Document, ResponseData, Sample};
use crate::error::{AdyError, Result};

/// Reads and writes per-channel response files.
#[derive(Debug, Clone, Default)]
pub struct ResponseCodec {
    header: HeaderTemplate,
}

impl ResponseCodec {
    /// Create a codec that prefixes exported files with `header`.
    pub fn new(header: HeaderTemplate) -> Self {
        Self { header }
    }

    /// Write every `responseData` entry of every channel to `dest_dir`.
    ///
    /// Returns the written paths in document order.
    ///
    /// # Errors
    /// * `NotFound` / `NotADirectory` - If `dest_dir` is not a directory
    /// * `DuplicateCommandId` - If two channels would write the same files
    /// * `InvalidName` - If a `commandId` or position label cannot be used as
    ///   a file name that import would read back
    /// * `FileWrite` - If a file cannot be written
    pub fn export_responses(&self, document: &Document, dest_dir: &Path) -> Result<Vec<PathBuf>> {
        ensure_directory(dest_dir)?;
        document.ensure_unique_command_ids()?;
        for channel in &document.detected_channels {
            check_file_names(&channel.command_id, &channel.response_data, LabelRule::Position)?;
        }

        info!("Extracting response data to {}...", dest_dir.display());

        let mut written = Vec::new();
        for channel in &document.detected_channels {
            let data = &channel.response_data;
            written.extend(self.write_label_files(dest_dir, &channel.command_id, data)?);
        }

        info!("Extracting response data done: {} files", written.len());
        Ok(written)
    }

    /// Write the named curve filter (`referenceCurveFilter` or
    /// `flatCurveFilter`) of every channel to `dest_dir`.
    ///
    /// # Errors
    /// * `InvalidKey` - If `curve_key` names neither curve filter
    /// * Same as [`ResponseCodec::export_responses`] otherwise
    pub fn export_curve_filter(
        &self,
        document: &Document,
        dest_dir: &Path,
        curve_key: &str,
    ) -> Result<Vec<PathBuf>> {
        let filter: CurveFilter = curve_key.parse()?;
        ensure_directory(dest_dir)?;
        document.ensure_unique_command_ids()?;
        for channel in &document.detected_channels {
            if let Some(data) = channel.curve_filter(filter) {
                check_file_names(&channel.command_id, data, LabelRule::CurveLabel)?;
            }
        }

        info!("Extracting {} to {}...", filter, dest_dir.display());

        let mut written = Vec::new();
        for channel in &document.detected_channels {
            match channel.curve_filter(filter) {
                Some(data) => {
                    written.extend(self.write_label_files(dest_dir, &channel.command_id, data)?)
                }
                None => debug!("{} has no {}, skipping", channel.command_id, filter),
            }
        }

        info!("Extracting {} done: {} files", filter, written.len());
        Ok(written)
    }

    /// Replace `responseData` entries with the content of matching
    /// `<position>_<commandId>.txt` files in `source_dir`.
    ///
    /// Files that match no channel are ignored. A matched file that cannot be
    /// read is recorded as a failure and the remaining files are still
    /// imported.
    pub fn import_responses(
        &self,
        document: &mut Document,
        source_dir: &Path,
    ) -> Result<ImportReport> {
        info!("Importing response data from {}...", source_dir.display());

        let files = list_text_files(source_dir)?;
        let mut report = ImportReport::default();

        for channel in &mut document.detected_channels {
            import_label_files(
                &files,
                &channel.command_id,
                LabelRule::Position,
                &mut channel.response_data,
                &mut report,
            );
        }

        info!(
            "Importing response data done: {} files, {} failures",
            report.imported.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Replace curve filter entries with the content of matching
    /// `<label>_<commandId>.txt` files, where the label is an alphanumeric
    /// word of at least nine characters.
    pub fn import_curve_filter(
        &self,
        document: &mut Document,
        source_dir: &Path,
        curve_key: &str,
    ) -> Result<ImportReport> {
        let filter: CurveFilter = curve_key.parse()?;

        info!("Importing {} from {}...", filter, source_dir.display());

        let files = list_text_files(source_dir)?;
        let mut report = ImportReport::default();

        for channel in &mut document.detected_channels {
            let command_id = channel.command_id.as_str();
            let has_match = files.iter().any(|path| {
                file_name(path)
                    .and_then(|name| match_label_file(name, command_id, LabelRule::CurveLabel))
                    .is_some()
            });
            if !has_match {
                continue;
            }

            let command_id = channel.command_id.clone();
            import_label_files(
                &files,
                &command_id,
                LabelRule::CurveLabel,
                channel.curve_filter_mut(filter),
                &mut report,
            );
        }

        info!(
            "Importing {} done: {} files, {} failures",
            filter,
            report.imported.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn write_label_files(
        &self,
        dest_dir: &Path,
        command_id: &str,
        data: &ResponseData,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(data.len());

        for (label, samples) in data {
            let path = dest_dir.join(label_file_name(label, command_id));
            fs::write(&path, self.header.render(samples)).map_err(|e| AdyError::FileWrite {
                path: path.clone(),
                source: e,
            })?;
            debug!("{} {}: {} samples -> {}", command_id, label, samples.len(), path.display());
            written.push(path);
        }

        Ok(written)
    }
}

/// Parse the data lines of a response file.
pub fn read_samples(path: &Path) -> Result<Vec<Sample>> {
    let content = read_latin1(path)?;
    Ok(data_lines(&content)
        .map(|(_, line)| Sample::new(line))
        .collect())
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

fn import_label_files(
    files: &[PathBuf],
    command_id: &str,
    rule: LabelRule,
    target: &mut ResponseData,
    report: &mut ImportReport,
) {
    for path in files {
        let Some(label) = file_name(path).and_then(|name| match_label_file(name, command_id, rule))
        else {
            continue;
        };

        match read_samples(path) {
            Ok(samples) => {
                debug!("{} {}: {} samples <- {}", command_id, label, samples.len(), path.display());
                report.imported.push(ImportedFile {
                    command_id: command_id.to_string(),
                    label: Some(label.to_string()),
                    path: path.clone(),
                    value_count: samples.len(),
                });
                target.insert(label.to_string(), samples);
            }
            Err(e) => {
                warn!("{}: cannot import '{}': {}", command_id, path.display(), e);
                report.failures.push(ChannelFailure {
                    command_id: command_id.to_string(),
                    error: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::header::REW_IMPULSE_HEADER;
    use crate::document::Channel;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn tokens(samples: &[Sample]) -> Vec<&str> {
        samples.iter().map(Sample::token).collect()
    }

    fn single_channel_document() -> Document {
        Document::new(vec![Channel::new("C1").with_response("1", ["0.1", "0.2"])])
    }

    #[test]
    fn test_export_writes_header_blank_line_and_samples() {
        let temp = tempdir().unwrap();
        let codec = ResponseCodec::default();

        let written = codec
            .export_responses(&single_channel_document(), temp.path())
            .unwrap();

        assert_eq!(written, vec![temp.path().join("1_C1.txt")]);
        let content = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(content, format!("{}\n0.1\n0.2", REW_IMPULSE_HEADER));
    }

    #[test]
    fn test_export_keeps_tokens_verbatim() {
        let temp = tempdir().unwrap();
        let document =
            Document::new(vec![Channel::new("FL").with_response("0", ["1.0E-5", "-0.000"])]);

        ResponseCodec::default()
            .export_responses(&document, temp.path())
            .unwrap();

        let content = fs::read_to_string(temp.path().join("0_FL.txt")).unwrap();
        assert!(content.ends_with("\n1.0E-5\n-0.000"));
    }

    #[test]
    fn test_export_into_missing_directory() {
        let temp = tempdir().unwrap();
        let result = ResponseCodec::default()
            .export_responses(&single_channel_document(), &temp.path().join("missing"));
        assert!(matches!(result, Err(AdyError::NotFound { .. })));
    }

    #[test]
    fn test_export_refuses_duplicate_command_ids() {
        let temp = tempdir().unwrap();
        let document = Document::new(vec![
            Channel::new("C1").with_response("1", ["0.1"]),
            Channel::new("C1").with_response("1", ["0.9"]),
        ]);

        let result = ResponseCodec::default().export_responses(&document, temp.path());

        assert!(matches!(result, Err(AdyError::DuplicateCommandId { .. })));
        assert!(!temp.path().join("1_C1.txt").exists());
    }

    #[test]
    fn test_import_replaces_position_and_ignores_other_files() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("1_C1.txt"),
            "* comment\n0 // Peak index\n\n0.5\n0.25  \n",
        )
        .unwrap();
        fs::write(temp.path().join("2_C1.txt"), "0.75\n").unwrap();
        fs::write(temp.path().join("1_FL.txt"), "9\n").unwrap();
        fs::write(temp.path().join("readme.txt"), "9\n").unwrap();

        let mut document = single_channel_document();
        let report = ResponseCodec::default()
            .import_responses(&mut document, temp.path())
            .unwrap();

        let data = &document.detected_channels[0].response_data;
        assert_eq!(tokens(&data["1"]), vec!["0.5", "0.25"]);
        assert_eq!(tokens(&data["2"]), vec!["0.75"]);
        assert_eq!(report.imported.len(), 2);
        assert!(report.is_clean());
        assert_eq!(report.imported_channels(), vec!["C1"]);
    }

    #[test]
    fn test_import_from_missing_directory() {
        let temp = tempdir().unwrap();
        let mut document = single_channel_document();
        let result =
            ResponseCodec::default().import_responses(&mut document, &temp.path().join("none"));
        assert!(matches!(result, Err(AdyError::NotFound { .. })));
    }

    #[test]
    fn test_export_then_import_round_trip() {
        let temp = tempdir().unwrap();
        let codec = ResponseCodec::default();
        let original = Document::new(vec![
            Channel::new("FL")
                .with_response("0", ["1", "0.5", "-0.25"])
                .with_response("1", ["0.125", "3E-4"]),
            Channel::new("SW1").with_response("0", ["0", "0"]),
        ]);

        codec.export_responses(&original, temp.path()).unwrap();

        let mut restored = original.clone();
        for channel in &mut restored.detected_channels {
            for samples in channel.response_data.values_mut() {
                samples.clear();
            }
        }
        codec.import_responses(&mut restored, temp.path()).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_curve_filter_export_and_import() {
        let temp = tempdir().unwrap();
        let codec = ResponseCodec::default();

        let mut channel = Channel::new("C");
        channel
            .curve_filter_mut(CurveFilter::Reference)
            .insert("dispersion".to_string(), vec![Sample::new("0.5"), Sample::new("0.5")]);
        let document = Document::new(vec![channel, Channel::new("FL")]);

        let written = codec
            .export_curve_filter(&document, temp.path(), "referenceCurveFilter")
            .unwrap();
        assert_eq!(written, vec![temp.path().join("dispersion_C.txt")]);

        fs::write(temp.path().join("dispersion_C.txt"), "* edited\n0.1\n0.2\n0.3\n").unwrap();
        let mut edited = document.clone();
        let report = codec
            .import_curve_filter(&mut edited, temp.path(), "referenceCurveFilter")
            .unwrap();

        assert_eq!(report.imported.len(), 1);
        let reference = edited.detected_channels[0]
            .curve_filter(CurveFilter::Reference)
            .unwrap();
        assert_eq!(tokens(&reference["dispersion"]), vec!["0.1", "0.2", "0.3"]);
        assert!(edited.detected_channels[1].reference_curve_filter.is_none());
    }

    #[test]
    fn test_curve_filter_import_into_flat_filter_creates_it() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("speakerlevel_FL.txt"), "1\n2\n").unwrap();

        let mut document = Document::new(vec![Channel::new("FL")]);
        ResponseCodec::default()
            .import_curve_filter(&mut document, temp.path(), "flatCurveFilter")
            .unwrap();

        let flat = document.detected_channels[0]
            .curve_filter(CurveFilter::Flat)
            .unwrap();
        assert_eq!(tokens(&flat["speakerlevel"]), vec!["1", "2"]);
    }

    #[test]
    fn test_curve_filter_rejects_unknown_key() {
        let temp = tempdir().unwrap();
        let codec = ResponseCodec::default();
        let mut document = single_channel_document();

        let export = codec.export_curve_filter(&document, temp.path(), "responseData");
        assert!(matches!(export, Err(AdyError::InvalidKey { .. })));

        let import = codec.import_curve_filter(&mut document, temp.path(), "customCurve");
        assert!(matches!(import, Err(AdyError::InvalidKey { .. })));
    }

    #[test]
    fn test_import_never_keeps_comment_lines() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("0_C1.txt"),
            "*a\n1 // b\n\n  \n*\n0.5\nx//y\n0.6\n",
        )
        .unwrap();

        let mut document = single_channel_document();
        ResponseCodec::default()
            .import_responses(&mut document, temp.path())
            .unwrap();

        let samples = &document.detected_channels[0].response_data["0"];
        assert_eq!(tokens(samples), vec!["0.5", "0.6"]);
        assert!(samples.iter().all(|s| {
            let token = s.token();
            !token.is_empty() && !token.starts_with('*') && !token.contains("//")
        }));
    }

    #[test]
    fn test_export_rejects_label_outside_directory() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        let document = Document::new(vec![
            Channel::new("C").with_response("0", ["1"]),
            Channel::new("FL").with_response("../escaped", ["1"]),
        ]);

        let result = ResponseCodec::default().export_responses(&document, &out);

        assert!(matches!(
            result,
            Err(AdyError::InvalidName { ref name, .. }) if name == "../escaped"
        ));
        assert!(!temp.path().join("escaped_FL.txt").exists());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_export_rejects_labels_import_cannot_read() {
        let temp = tempdir().unwrap();
        let document = Document::new(vec![Channel::new("FL").with_response("front", ["1"])]);

        let result = ResponseCodec::default().export_responses(&document, temp.path());
        assert!(matches!(result, Err(AdyError::InvalidName { .. })));

        let mut channel = Channel::new("C");
        channel
            .curve_filter_mut(CurveFilter::Flat)
            .insert("short".to_string(), vec![Sample::new("1")]);
        let document = Document::new(vec![channel]);

        let result = ResponseCodec::default().export_curve_filter(
            &document,
            temp.path(),
            "flatCurveFilter",
        );
        assert!(matches!(result, Err(AdyError::InvalidName { .. })));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_rejects_command_id_with_separator() {
        let temp = tempdir().unwrap();
        let document = Document::new(vec![Channel::new("a/FL").with_response("0", ["1"])]);

        let result = ResponseCodec::default().export_responses(&document, temp.path());
        assert!(matches!(result, Err(AdyError::InvalidName { .. })));
    }
}
