//! CLI Command Implementations
//!
//! Runs the steps selected on the command line against one loaded document.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::analysis::export_frequency_response;
use crate::calibration::{apply_defaults, clean_responses};
use crate::cli::Cli;
use crate::codec::{import_target_curve, HeaderTemplate, ImportReport, ResponseCodec};
use crate::document::{self, CurveFilter, Document};
use crate::error::{AdyError, Result};

/// Steps to run on a document, in the order [`AdyTool::process`] applies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Export impulse files into this directory (created if missing).
    pub extract: Option<PathBuf>,
    /// Export frequency response files into this directory (created if missing).
    pub extract_freq: Option<PathBuf>,
    /// Curve filter key used by `export_curve` / `import_curve`.
    pub curve_key: String,
    pub export_curve: Option<PathBuf>,
    pub import_curve: Option<PathBuf>,
    pub import_responses: Option<PathBuf>,
    /// Reset calibration fields.
    pub default: bool,
    /// Replace responses with a perfect impulse.
    pub clean: bool,
    /// Inject target curves from this directory.
    pub filter: Option<PathBuf>,
    /// Custom impulse header template.
    pub header: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            extract: None,
            extract_freq: None,
            curve_key: "referenceCurveFilter".to_string(),
            export_curve: None,
            import_curve: None,
            import_responses: None,
            default: false,
            clean: false,
            filter: None,
            header: None,
        }
    }
}

impl From<&Cli> for ToolConfig {
    fn from(cli: &Cli) -> Self {
        let extract = cli
            .extract
            .as_ref()
            .map(|dir| dir.clone().unwrap_or_else(|| default_extract_dir(&cli.input)));

        Self {
            extract,
            extract_freq: cli.extract_freq.clone(),
            curve_key: cli.curve_key.clone(),
            export_curve: cli.export_curve.clone(),
            import_curve: cli.import_curve.clone(),
            import_responses: cli.import_responses.clone(),
            default: cli.default,
            clean: cli.clean,
            filter: cli.filter.clone(),
            header: cli.header.clone(),
        }
    }
}

/// `<dir>/<stem>/` next to the input file.
pub fn default_extract_dir(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "extract".to_string());
    input.with_file_name(stem)
}

/// Applies a [`ToolConfig`] to ady files.
#[derive(Debug, Clone, Default)]
pub struct AdyTool {
    config: ToolConfig,
}

impl AdyTool {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Load `input`, run the configured steps and save the result.
    ///
    /// Order: exports (impulse, curve filter, frequency), imports (responses,
    /// curve filter), defaults, clean, filter injection, save.
    ///
    /// Returns the path of the written document.
    pub fn process(&self, input: &Path, output: Option<&Path>) -> Result<PathBuf> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| document::default_output_path(input));

        let mut document = document::load(input)?;
        self.run(&mut document)?;
        document::save(&document, &output)?;

        Ok(output)
    }

    /// Run the configured steps on an already loaded document.
    pub fn run(&self, document: &mut Document) -> Result<()> {
        let codec = self.codec()?;
        if self.config.export_curve.is_some() || self.config.import_curve.is_some() {
            self.config.curve_key.parse::<CurveFilter>()?;
        }

        if let Some(dir) = &self.config.extract {
            create_dir(dir)?;
            codec.export_responses(document, dir)?;
        }
        if let Some(dir) = &self.config.export_curve {
            create_dir(dir)?;
            codec.export_curve_filter(document, dir, &self.config.curve_key)?;
        }
        if let Some(dir) = &self.config.extract_freq {
            create_dir(dir)?;
            let report = export_frequency_response(document, dir)?;
            for failure in &report.failures {
                warn!(
                    "{} position {}: no frequency file written",
                    failure.command_id, failure.position
                );
            }
        }

        if let Some(dir) = &self.config.import_responses {
            let report = codec.import_responses(document, dir)?;
            log_report("response import", &report);
        }
        if let Some(dir) = &self.config.import_curve {
            let report = codec.import_curve_filter(document, dir, &self.config.curve_key)?;
            log_report("curve filter import", &report);
        }

        if self.config.default {
            apply_defaults(document);
        }
        if self.config.clean {
            clean_responses(document);
        }
        if let Some(dir) = &self.config.filter {
            let report = import_target_curve(document, dir)?;
            log_report("filter injection", &report);
        }

        Ok(())
    }

    fn codec(&self) -> Result<ResponseCodec> {
        let header = match &self.config.header {
            Some(path) => HeaderTemplate::load(path)?,
            None => HeaderTemplate::builtin(),
        };
        Ok(ResponseCodec::new(header))
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| AdyError::FileWrite {
        path: dir.to_path_buf(),
        source: e,
    })
}

fn log_report(step: &str, report: &ImportReport) {
    if report.is_clean() {
        info!(
            "{}: {} channels updated",
            step,
            report.imported_channels().len()
        );
    } else {
        warn!(
            "{}: {} channels updated, {} failed: {}",
            step,
            report.imported_channels().len(),
            report.failures.len(),
            report
                .failures
                .iter()
                .map(|f| f.command_id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_config_from_cli_defaults_extract_dir() {
        let cli = Cli::parse_from(["multeq-cli", "-i", "/data/room.ady", "-e", "-d"]);
        let config = ToolConfig::from(&cli);

        assert_eq!(config.extract, Some(PathBuf::from("/data/room")));
        assert!(config.default);
        assert!(!config.clean);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_config_keeps_explicit_extract_dir() {
        let cli = Cli::parse_from(["multeq-cli", "-i", "room.ady", "--extract", "irs"]);
        let config = ToolConfig::from(&cli);
        assert_eq!(config.extract, Some(PathBuf::from("irs")));
    }

    #[test]
    fn test_default_config_does_nothing() {
        let config = ToolConfig::default();
        let mut document =
            Document::new(vec![crate::document::Channel::new("C").with_response("0", ["0.5"])]);
        let before = document.clone();

        AdyTool::new(config).run(&mut document).unwrap();
        assert_eq!(document, before);
    }

    #[test]
    fn test_unknown_curve_key_creates_no_directory() {
        let temp = tempfile::tempdir().unwrap();
        let curves = temp.path().join("curves");
        let config = ToolConfig {
            curve_key: "responseData".to_string(),
            export_curve: Some(curves.clone()),
            ..Default::default()
        };
        let mut document = Document::new(vec![crate::document::Channel::new("C")]);

        let result = AdyTool::new(config).run(&mut document);

        assert!(matches!(result, Err(AdyError::InvalidKey { .. })));
        assert!(!curves.exists());
    }

    #[test]
    fn test_missing_header_template_aborts() {
        let config = ToolConfig {
            header: Some(PathBuf::from("/nonexistent/header.template")),
            ..Default::default()
        };
        let mut document = Document::default();
        let result = AdyTool::new(config).run(&mut document);
        assert!(matches!(result, Err(AdyError::NotFound { .. })));
    }
}
