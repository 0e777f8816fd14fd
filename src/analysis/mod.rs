//! Analysis Module
//!
//! Frequency-domain views of the impulse responses stored in a document.

pub mod frequency;

pub use frequency::{
    export_frequency_response, FrequencyAnalyzer, FrequencyExportReport, FrequencyResponse,
    SAMPLE_RATE,
};
