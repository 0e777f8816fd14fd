//! Bulk edits of channel calibration
//!
//! Both operations are idempotent and touch every detected channel.

use log::info;

use crate::document::{Crossover, Document, Sample, SpeakerType, TextField};

/// Length of a MultEQ impulse response.
pub const IMPULSE_LENGTH: usize = 16384;

/// Values written by [`apply_defaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationDefaults {
    /// Distance in metres.
    pub distance_m: f64,
    /// Trim level in dB.
    pub level_db: f64,
    pub crossover: Crossover,
    pub speaker_type: SpeakerType,
    pub midrange_compensation: bool,
}

impl Default for CalibrationDefaults {
    fn default() -> Self {
        Self {
            distance_m: 3.0,
            level_db: 0.0,
            crossover: Crossover::FullRange,
            speaker_type: SpeakerType::Large,
            midrange_compensation: false,
        }
    }
}

impl CalibrationDefaults {
    /// Overwrite the calibration fields of every channel.
    pub fn apply(&self, document: &mut Document) {
        for channel in &mut document.detected_channels {
            channel.custom_distance = Some(TextField::new(self.distance_m));
            channel.custom_level = Some(TextField::new(self.level_db));
            channel.custom_crossover = Some(TextField::new(self.crossover.clone()));
            channel.custom_speaker_type = Some(TextField::new(self.speaker_type.clone()));
            channel.midrange_compensation = Some(TextField::new(self.midrange_compensation));
        }
    }
}

/// Reset every channel to 3 m, 0 dB, full range, large speaker and no
/// midrange compensation.
pub fn apply_defaults(document: &mut Document) {
    info!("Resetting default values...");
    CalibrationDefaults::default().apply(document);
    info!(
        "Resetting default values done: {} channels",
        document.detected_channels.len()
    );
}

/// A unit impulse of `len` samples: `1` followed by zeros.
pub fn perfect_impulse(len: usize) -> Vec<Sample> {
    let mut samples = vec![Sample::new("0"); len];
    if let Some(first) = samples.first_mut() {
        *first = Sample::new("1");
    }
    samples
}

/// Replace every measured response with a perfect impulse.
pub fn clean_responses(document: &mut Document) {
    info!("Setting perfect speaker response data...");

    let impulse = perfect_impulse(IMPULSE_LENGTH);
    let mut replaced = 0;
    for channel in &mut document.detected_channels {
        for samples in channel.response_data.values_mut() {
            samples.clone_from(&impulse);
            replaced += 1;
        }
    }

    info!("Setting perfect speaker response data done: {} responses", replaced);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Channel;
    use pretty_assertions::assert_eq;

    fn document() -> Document {
        let mut fl = Channel::new("FL")
            .with_response("0", ["0.3", "0.1"])
            .with_response("1", ["0.2"]);
        fl.custom_distance = Some(TextField::new(4.2));
        fl.custom_level = Some(TextField::new(-3.5));
        fl.custom_crossover = Some(TextField::new(Crossover::Frequency(80)));
        fl.custom_speaker_type = Some(TextField::new(SpeakerType::Small));
        fl.midrange_compensation = Some(TextField::new(true));

        Document::new(vec![fl, Channel::new("SW1").with_response("0", ["1"])])
    }

    #[test]
    fn test_apply_defaults() {
        let mut doc = document();
        apply_defaults(&mut doc);

        for channel in &doc.detected_channels {
            assert_eq!(channel.custom_distance, Some(TextField::new(3.0)));
            assert_eq!(channel.custom_level, Some(TextField::new(0.0)));
            assert_eq!(channel.custom_crossover, Some(TextField::new(Crossover::FullRange)));
            assert_eq!(channel.custom_speaker_type, Some(TextField::new(SpeakerType::Large)));
            assert_eq!(channel.midrange_compensation, Some(TextField::new(false)));
        }
    }

    #[test]
    fn test_apply_defaults_rewrites_loaded_text() {
        let json = concat!(
            r#"{"detectedChannels":[{"commandId":"C","#,
            r#""customDistance":"3.0","midrangeCompensation":false}]}"#
        );
        let mut doc = Document::from_json_str(json).unwrap();
        apply_defaults(&mut doc);

        let value: serde_json::Value =
            serde_json::from_str(&doc.to_json_string(false).unwrap()).unwrap();
        assert_eq!(value["detectedChannels"][0]["customDistance"], "3");
        assert_eq!(value["detectedChannels"][0]["midrangeCompensation"], "false");
    }

    #[test]
    fn test_apply_defaults_is_idempotent() {
        let mut once = document();
        apply_defaults(&mut once);
        let mut twice = once.clone();
        apply_defaults(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_defaults_leaves_responses_alone() {
        let mut doc = document();
        let before = doc.detected_channels[0].response_data.clone();
        apply_defaults(&mut doc);
        assert_eq!(doc.detected_channels[0].response_data, before);
    }

    #[test]
    fn test_custom_defaults() {
        let mut doc = document();
        let defaults = CalibrationDefaults {
            distance_m: 2.5,
            ..Default::default()
        };
        defaults.apply(&mut doc);
        assert_eq!(doc.detected_channels[1].custom_distance, Some(TextField::new(2.5)));
    }

    #[test]
    fn test_perfect_impulse() {
        let impulse = perfect_impulse(4);
        let tokens: Vec<&str> = impulse.iter().map(Sample::token).collect();
        assert_eq!(tokens, vec!["1", "0", "0", "0"]);
        assert!(perfect_impulse(0).is_empty());
    }

    #[test]
    fn test_clean_responses() {
        let mut doc = document();
        clean_responses(&mut doc);

        for channel in &doc.detected_channels {
            for samples in channel.response_data.values() {
                assert_eq!(samples.len(), IMPULSE_LENGTH);
                assert_eq!(samples[0].token(), "1");
                assert!(samples[1..].iter().all(|s| s.token() == "0"));
            }
        }
        let positions: Vec<&str> = doc.detected_channels[0]
            .response_data
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(positions, vec!["0", "1"]);
    }

    #[test]
    fn test_clean_responses_is_idempotent() {
        let mut once = document();
        clean_responses(&mut once);
        let mut twice = once.clone();
        clean_responses(&mut twice);
        assert_eq!(once, twice);
    }
}
