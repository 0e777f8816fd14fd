//! Frequency response of measured impulse responses
//!
//! Computes the one-sided spectrum of each `responseData` entry and writes it
//! as a three-column REW text file (frequency, SPL, phase).

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::codec::text::{check_file_names, ensure_directory, label_file_name, LabelRule};
use crate::document::{Document, Sample};
use crate::error::{AdyError, Result};

/// Sample rate of every MultEQ impulse response.
pub const SAMPLE_RATE: u32 = 48_000;

/// Offset added to the dB magnitude so levels land in a plausible SPL range.
pub const SPL_OFFSET_DB: f64 = 75.0;

/// Smallest magnitude fed to `log10`. Empty bins come out at -125 dB after
/// the offset instead of minus infinity.
pub const MAGNITUDE_FLOOR: f64 = 1e-10;

/// Prefix of exported frequency response files.
pub const FREQUENCY_FILE_PREFIX: &str = "freq_";

/// One-sided frequency response.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyResponse {
    /// Bin frequencies in Hz, from 0 to Nyquist.
    pub frequencies: Vec<f64>,
    /// Magnitude in dB including [`SPL_OFFSET_DB`].
    pub magnitude_db: Vec<f64>,
    /// Phase in degrees, in (-180, 180].
    pub phase_deg: Vec<f64>,
    /// Spacing between bins in Hz.
    pub step_hz: f64,
}

impl FrequencyResponse {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Render as REW text: a `*` header line then one row per bin.
    pub fn to_rew_text(&self) -> String {
        let mut out = String::with_capacity(40 * (self.len() + 1));
        let _ = writeln!(out, "*Frequency Step: {} Hz", format_step(self.step_hz));

        for ((freq, mag), phase) in self
            .frequencies
            .iter()
            .zip(&self.magnitude_db)
            .zip(&self.phase_deg)
        {
            let _ = writeln!(out, "{:10.6} {:.6} {:10.4}", freq, mag, phase);
        }

        out
    }
}

/// Write the step like a float literal (`2.9296875`, `12000.0`).
fn format_step(step: f64) -> String {
    if step.fract() == 0.0 {
        format!("{:.1}", step)
    } else {
        step.to_string()
    }
}

/// Real-input FFT with plan caching.
pub struct FrequencyAnalyzer {
    planner: FftPlanner<f64>,
    fft: Option<(usize, Arc<dyn Fft<f64>>)>,
    sample_rate: u32,
}

impl Default for FrequencyAnalyzer {
    fn default() -> Self {
        Self::new(SAMPLE_RATE)
    }
}

impl FrequencyAnalyzer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            planner: FftPlanner::new(),
            fft: None,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Spectrum of a real signal: `N/2 + 1` bins spanning 0 Hz to Nyquist.
    pub fn analyze(&mut self, signal: &[f64]) -> FrequencyResponse {
        let n = signal.len();
        if n == 0 {
            return FrequencyResponse {
                frequencies: Vec::new(),
                magnitude_db: Vec::new(),
                phase_deg: Vec::new(),
                step_hz: 0.0,
            };
        }

        let fft = match &self.fft {
            Some((len, fft)) if *len == n => Arc::clone(fft),
            _ => {
                let fft = self.planner.plan_fft_forward(n);
                self.fft = Some((n, Arc::clone(&fft)));
                fft
            }
        };

        let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
        fft.process(&mut buffer);

        let bins = n / 2 + 1;
        let step_hz = self.sample_rate as f64 / n as f64;

        let frequencies = (0..bins).map(|k| k as f64 * step_hz).collect();
        let magnitude_db = buffer[..bins]
            .iter()
            .map(|c| 20.0 * c.norm().max(MAGNITUDE_FLOOR).log10() + SPL_OFFSET_DB)
            .collect();
        let phase_deg = buffer[..bins]
            .iter()
            .map(|c| c.im.atan2(c.re).to_degrees())
            .collect();

        FrequencyResponse {
            frequencies,
            magnitude_db,
            phase_deg,
            step_hz,
        }
    }
}

/// A measurement whose frequency response could not be exported.
#[derive(Debug)]
pub struct MeasurementFailure {
    pub command_id: String,
    pub position: String,
    pub error: AdyError,
}

/// Outcome of [`export_frequency_response`].
#[derive(Debug, Default)]
pub struct FrequencyExportReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<MeasurementFailure>,
}

impl FrequencyExportReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Numeric values of a response, failing on the first non-numeric token.
pub fn sample_values(command_id: &str, position: &str, samples: &[Sample]) -> Result<Vec<f64>> {
    if samples.is_empty() {
        return Err(AdyError::EmptyResponse {
            command_id: command_id.to_string(),
            position: position.to_string(),
        });
    }

    samples
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            sample.value().ok_or_else(|| AdyError::InvalidSample {
                command_id: command_id.to_string(),
                position: position.to_string(),
                index,
                token: sample.token().to_string(),
            })
        })
        .collect()
}

/// Write `freq_<position>_<commandId>.txt` for every measurement.
///
/// A measurement with an empty or non-numeric response is reported and
/// skipped; no file is written for it.
///
/// # Errors
/// * `NotFound` / `NotADirectory` - If `dest_dir` is not a directory
/// * `DuplicateCommandId` - If two channels would write the same files
/// * `InvalidName` - If a `commandId` or position label is not a safe file name
/// * `FileWrite` - If a file cannot be written
pub fn export_frequency_response(
    document: &Document,
    dest_dir: &Path,
) -> Result<FrequencyExportReport> {
    ensure_directory(dest_dir)?;
    document.ensure_unique_command_ids()?;
    for channel in &document.detected_channels {
        check_file_names(&channel.command_id, &channel.response_data, LabelRule::Position)?;
    }

    info!("Extracting response data to frequency format in {}...", dest_dir.display());

    let mut analyzer = FrequencyAnalyzer::default();
    let mut report = FrequencyExportReport::default();

    for channel in &document.detected_channels {
        for (position, samples) in &channel.response_data {
            let signal = match sample_values(&channel.command_id, position, samples) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("{} position {} skipped: {}", channel.command_id, position, e);
                    report.failures.push(MeasurementFailure {
                        command_id: channel.command_id.clone(),
                        position: position.clone(),
                        error: e,
                    });
                    continue;
                }
            };

            let response = analyzer.analyze(&signal);
            let path = dest_dir.join(format!(
                "{}{}",
                FREQUENCY_FILE_PREFIX,
                label_file_name(position, &channel.command_id)
            ));

            fs::write(&path, response.to_rew_text()).map_err(|e| AdyError::FileWrite {
                path: path.clone(),
                source: e,
            })?;
            report.written.push(path);
        }
    }

    info!(
        "Extracting frequency response done: {} files, {} skipped",
        report.written.len(),
        report.failures.len()
    );
    Ok(report)
}
