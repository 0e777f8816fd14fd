//! CLI Module
//!
//! Command-line interface over the ady engine. One invocation loads a
//! document, runs the selected steps and writes the result.

pub mod commands;

use clap::Parser;
use std::path::PathBuf;

pub use commands::{AdyTool, ToolConfig};

/// Extracts REW impulse responses from MultEQ ady files and edits their calibration
#[derive(Parser, Debug)]
#[command(name = "multeq-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to ady file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to output result file, defaults to <input>.result.ady. WARNING: it will be overwritten
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Set default values: 0 dB level, 3 m distance, large speaker, full range,
    /// midrange compensation off
    #[arg(short, long)]
    pub default: bool,

    /// Replace every response with a perfect impulse
    #[arg(short, long)]
    pub clean: bool,

    /// Folder holding <commandId>.txt filters to inject into the custom target curves
    #[arg(short, long, value_name = "DIR")]
    pub filter: Option<PathBuf>,

    /// Export every response as a REW impulse file (defaults to a folder named after the input)
    #[arg(short, long, value_name = "DIR")]
    pub extract: Option<Option<PathBuf>>,

    /// Export every response as a REW frequency response file
    #[arg(long, value_name = "DIR")]
    pub extract_freq: Option<PathBuf>,

    /// Import <position>_<commandId>.txt impulse files back into the responses
    #[arg(long, value_name = "DIR")]
    pub import_responses: Option<PathBuf>,

    /// Curve filter used by --export-curve and --import-curve
    #[arg(long, value_name = "KEY", default_value = "referenceCurveFilter")]
    pub curve_key: String,

    /// Export the selected curve filter of every channel
    #[arg(long, value_name = "DIR")]
    pub export_curve: Option<PathBuf>,

    /// Import the selected curve filter of every channel
    #[arg(long, value_name = "DIR")]
    pub import_curve: Option<PathBuf>,

    /// Header template prepended to exported impulse files
    #[arg(long, value_name = "FILE")]
    pub header: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
