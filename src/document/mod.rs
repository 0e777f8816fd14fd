//! Document Module
//!
//! In-memory model of an ady calibration file:
//! - Document and channel schema
//! - Typed calibration fields with their text encoding
//! - Loading and saving

pub mod calibration;
pub mod io;
pub mod model;
pub mod sample;

pub use calibration::{Crossover, SpeakerType, TargetCurvePoint, TextCodec, TextField};
pub use io::{default_output_path, load, save};
pub use model::{Channel, CurveFilter, Document, ResponseData};
pub use sample::Sample;
