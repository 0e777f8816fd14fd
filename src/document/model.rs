//! ady document schema
//!
//! Only the fields the engine works with are typed. Every other key of the
//! document and of each channel is kept in `extra`. Keys are written back in
//! the order they were read; keys added by an edit follow them.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::calibration::{
    decode_field, Crossover, SpeakerType, TargetCurvePoint, TextField,
};
use crate::document::sample::Sample;
use crate::error::{AdyError, Result};

/// Measurement position label → ordered samples.
pub type ResponseData = IndexMap<String, Vec<Sample>>;

const DOCUMENT_KEYS: [&str; 1] = ["detectedChannels"];

const CHANNEL_KEYS: [&str; 10] = [
    "commandId",
    "responseData",
    "referenceCurveFilter",
    "flatCurveFilter",
    "customDistance",
    "customLevel",
    "customCrossover",
    "customSpeakerType",
    "midrangeCompensation",
    "customTargetCurvePoints",
];

/// A parsed ady document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Channels detected by the calibration run, in document order.
    pub detected_channels: Vec<Channel>,

    /// Unknown fields preserved for round-tripping.
    pub extra: Map<String, Value>,

    key_order: Vec<String>,
}

/// One detected loudspeaker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    /// Channel identifier (`FL`, `C`, `SW1`...). Used in exported file names.
    pub command_id: String,

    /// Measured impulse responses per microphone position.
    pub response_data: ResponseData,

    pub reference_curve_filter: Option<ResponseData>,

    pub flat_curve_filter: Option<ResponseData>,

    /// Distance in metres.
    pub custom_distance: Option<TextField<f64>>,

    /// Trim level in dB.
    pub custom_level: Option<TextField<f64>>,

    pub custom_crossover: Option<TextField<Crossover>>,

    pub custom_speaker_type: Option<TextField<SpeakerType>>,

    pub midrange_compensation: Option<TextField<bool>>,

    pub custom_target_curve_points: Option<Vec<TargetCurvePoint>>,

    /// Unknown fields preserved for round-tripping. A typed field that was
    /// `null` in the source is kept here.
    pub extra: Map<String, Value>,

    key_order: Vec<String>,
}

impl Channel {
    /// Create an empty channel with the given identifier.
    pub fn new(command_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            ..Default::default()
        }
    }

    /// Add a response for a measurement position (builder style).
    pub fn with_response<I, S>(mut self, position: impl Into<String>, samples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Sample>,
    {
        self.response_data
            .insert(position.into(), samples.into_iter().map(Into::into).collect());
        self
    }

    /// Curve filter data of the given kind, if present.
    pub fn curve_filter(&self, filter: CurveFilter) -> Option<&ResponseData> {
        match filter {
            CurveFilter::Reference => self.reference_curve_filter.as_ref(),
            CurveFilter::Flat => self.flat_curve_filter.as_ref(),
        }
    }

    /// Curve filter data of the given kind, created empty when absent.
    pub fn curve_filter_mut(&mut self, filter: CurveFilter) -> &mut ResponseData {
        let slot = match filter {
            CurveFilter::Reference => &mut self.reference_curve_filter,
            CurveFilter::Flat => &mut self.flat_curve_filter,
        };
        slot.get_or_insert_with(ResponseData::new)
    }

    fn had_key(&self, key: &str) -> bool {
        self.key_order.iter().any(|k| k == key)
    }
}

/// Source keys first, then typed keys, then keys added to `extra`.
fn ordered_keys<'a>(
    source: &'a [String],
    typed: &'a [&'a str],
    extra: &'a Map<String, Value>,
) -> Vec<&'a str> {
    let mut keys: Vec<&str> = Vec::with_capacity(source.len() + typed.len());
    let all = source
        .iter()
        .map(String::as_str)
        .chain(typed.iter().copied())
        .chain(extra.keys().map(String::as_str));
    for key in all {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Write the typed value if set, otherwise whatever `extra` holds for `key`.
fn write_entry<M, T>(
    map: &mut M,
    key: &str,
    typed: Option<&T>,
    extra: &Map<String, Value>,
) -> std::result::Result<(), M::Error>
where
    M: SerializeMap,
    T: Serialize + ?Sized,
{
    match typed {
        Some(value) => map.serialize_entry(key, value),
        None => match extra.get(key) {
            Some(value) => map.serialize_entry(key, value),
            None => Ok(()),
        },
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        let extra = &self.extra;

        for key in ordered_keys(&self.key_order, &CHANNEL_KEYS, extra) {
            match key {
                "commandId" => map.serialize_entry(key, &self.command_id)?,
                "responseData" => {
                    let written = !self.response_data.is_empty() || self.had_key(key);
                    write_entry(&mut map, key, written.then_some(&self.response_data), extra)?
                }
                "referenceCurveFilter" => {
                    write_entry(&mut map, key, self.reference_curve_filter.as_ref(), extra)?
                }
                "flatCurveFilter" => {
                    write_entry(&mut map, key, self.flat_curve_filter.as_ref(), extra)?
                }
                "customDistance" => {
                    write_entry(&mut map, key, self.custom_distance.as_ref(), extra)?
                }
                "customLevel" => write_entry(&mut map, key, self.custom_level.as_ref(), extra)?,
                "customCrossover" => {
                    write_entry(&mut map, key, self.custom_crossover.as_ref(), extra)?
                }
                "customSpeakerType" => {
                    write_entry(&mut map, key, self.custom_speaker_type.as_ref(), extra)?
                }
                "midrangeCompensation" => {
                    write_entry(&mut map, key, self.midrange_compensation.as_ref(), extra)?
                }
                "customTargetCurvePoints" => {
                    write_entry(&mut map, key, self.custom_target_curve_points.as_ref(), extra)?
                }
                _ => write_entry(&mut map, key, None::<&Value>, extra)?,
            }
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Channel::from_object(Map::deserialize(deserializer)?)
    }
}

impl Channel {
    fn from_object<E: de::Error>(object: Map<String, Value>) -> std::result::Result<Self, E> {
        let mut channel = Channel::default();
        let mut command_id = None;

        for (key, value) in object {
            channel.key_order.push(key.clone());
            match key.as_str() {
                "commandId" => command_id = Some(decode_field::<_, E>(&key, value)?),
                "responseData" => channel.response_data = decode_field::<_, E>(&key, value)?,
                _ if value.is_null() => {
                    channel.extra.insert(key, value);
                }
                "referenceCurveFilter" => {
                    channel.reference_curve_filter = Some(decode_field::<_, E>(&key, value)?)
                }
                "flatCurveFilter" => {
                    channel.flat_curve_filter = Some(decode_field::<_, E>(&key, value)?)
                }
                "customDistance" => {
                    channel.custom_distance = Some(decode_field::<_, E>(&key, value)?)
                }
                "customLevel" => channel.custom_level = Some(decode_field::<_, E>(&key, value)?),
                "customCrossover" => {
                    channel.custom_crossover = Some(decode_field::<_, E>(&key, value)?)
                }
                "customSpeakerType" => {
                    channel.custom_speaker_type = Some(decode_field::<_, E>(&key, value)?)
                }
                "midrangeCompensation" => {
                    channel.midrange_compensation = Some(decode_field::<_, E>(&key, value)?)
                }
                "customTargetCurvePoints" => {
                    channel.custom_target_curve_points = Some(decode_field::<_, E>(&key, value)?)
                }
                _ => {
                    channel.extra.insert(key, value);
                }
            }
        }

        channel.command_id = command_id.ok_or_else(|| E::missing_field("commandId"))?;
        Ok(channel)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        for key in ordered_keys(&self.key_order, &DOCUMENT_KEYS, &self.extra) {
            match key {
                "detectedChannels" => map.serialize_entry(key, &self.detected_channels)?,
                _ => write_entry(&mut map, key, None::<&Value>, &self.extra)?,
            }
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Document::from_object(Map::deserialize(deserializer)?)
    }
}

impl Document {
    fn from_object<E: de::Error>(object: Map<String, Value>) -> std::result::Result<Self, E> {
        let mut document = Document::default();
        let mut channels = None;

        for (key, value) in object {
            document.key_order.push(key.clone());
            match key.as_str() {
                "detectedChannels" => channels = Some(decode_field::<_, E>(&key, value)?),
                _ => {
                    document.extra.insert(key, value);
                }
            }
        }

        document.detected_channels =
            channels.ok_or_else(|| E::missing_field("detectedChannels"))?;
        Ok(document)
    }
}

/// The two curve-filter mappings a channel may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveFilter {
    Reference,
    Flat,
}

impl CurveFilter {
    pub const ALL: [CurveFilter; 2] = [CurveFilter::Reference, CurveFilter::Flat];

    /// JSON key of this filter inside a channel.
    pub fn key(&self) -> &'static str {
        match self {
            CurveFilter::Reference => "referenceCurveFilter",
            CurveFilter::Flat => "flatCurveFilter",
        }
    }
}

impl fmt::Display for CurveFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CurveFilter {
    type Err = AdyError;

    fn from_str(s: &str) -> Result<Self> {
        CurveFilter::ALL
            .into_iter()
            .find(|filter| filter.key() == s)
            .ok_or_else(|| AdyError::InvalidKey { key: s.to_string() })
    }
}

impl Document {
    /// Create a document from channels.
    pub fn new(detected_channels: Vec<Channel>) -> Self {
        Self {
            detected_channels,
            ..Default::default()
        }
    }

    /// Parse a document from JSON text.
    pub fn from_json_str(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a document from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Serialize the document. Compact output matches what the calibration
    /// software writes.
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Find a channel by identifier.
    pub fn channel(&self, command_id: &str) -> Option<&Channel> {
        self.detected_channels
            .iter()
            .find(|channel| channel.command_id == command_id)
    }

    /// `commandId` values used by more than one channel, in first-seen order.
    pub fn duplicate_command_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates: Vec<String> = Vec::new();

        for channel in &self.detected_channels {
            let id = channel.command_id.as_str();
            if !seen.insert(id) && !duplicates.iter().any(|d| d == id) {
                duplicates.push(id.to_string());
            }
        }

        duplicates
    }

    /// Fail if two channels would write to the same file names.
    pub fn ensure_unique_command_ids(&self) -> Result<()> {
        match self.duplicate_command_ids().into_iter().next() {
            Some(command_id) => Err(AdyError::DuplicateCommandId { command_id }),
            None => Ok(()),
        }
    }
}
