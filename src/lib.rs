//! multeq - MultEQ ady file engine
//!
//! Converts the impulse responses stored in an ady calibration file to and
//! from REW text files, and edits the channel calibration.
//!
//! # Architecture
//!
//! A [`Document`] is loaded once, passed by reference to each operation and
//! saved once:
//! - `codec`: impulse, curve filter and target curve text files
//! - `analysis`: frequency response export
//! - `calibration`: default values and perfect-impulse cleaning
//! - `cli`: the pipeline behind the `multeq-cli` binary

pub mod analysis;
pub mod calibration;
pub mod cli;
pub mod codec;
pub mod document;
pub mod error;

pub use analysis::{export_frequency_response, FrequencyAnalyzer, FrequencyResponse};
pub use calibration::{apply_defaults, clean_responses, CalibrationDefaults, IMPULSE_LENGTH};
pub use codec::{import_target_curve, HeaderTemplate, ImportReport, ResponseCodec};
pub use document::{load, save, Channel, CurveFilter, Document, Sample};
pub use error::{AdyError, Result};
