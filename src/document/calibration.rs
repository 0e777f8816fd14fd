//! Typed calibration fields of a detected channel.
//!
//! The ady format stores these values as short text tokens (`"3"`, `"F"`,
//! `"L"`, `"false"`, `"{20, -3}"`). A value read from a document keeps its
//! JSON and is written back untouched; a value set by an edit is written in
//! the text form.

use std::fmt;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Format a number the way the ady file writes it: integers without a
/// fractional part, everything else in shortest round-trip form.
pub fn format_number(value: f64) -> String {
    // Avoid writing "-0"
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

fn parse_number(token: &str) -> Option<f64> {
    token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Conversion between a calibration value and its JSON form.
pub trait TextCodec: Sized {
    /// What a valid JSON value looks like, for error messages.
    const EXPECTED: &'static str;

    fn decode(value: &Value) -> Option<Self>;

    fn encode(&self) -> Value;
}

impl TextCodec for f64 {
    const EXPECTED: &'static str = "a number or a numeric string";

    fn decode(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64(),
            Value::String(token) => parse_number(token),
            _ => None,
        }
    }

    fn encode(&self) -> Value {
        Value::String(format_number(*self))
    }
}

impl TextCodec for bool {
    const EXPECTED: &'static str = "a boolean or \"true\"/\"false\"";

    fn decode(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(*flag),
            Value::String(token) => match token.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn encode(&self) -> Value {
        Value::String(self.to_string())
    }
}

/// A calibration value together with the JSON it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct TextField<T> {
    value: T,
    source: Option<Value>,
}

impl<T: TextCodec> TextField<T> {
    /// A value set by an edit, written in the text form.
    pub fn new(value: T) -> Self {
        Self {
            value,
            source: None,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// The JSON the value was loaded from, if it was loaded.
    pub fn source(&self) -> Option<&Value> {
        self.source.as_ref()
    }
}

impl<T: TextCodec> From<T> for TextField<T> {
    fn from(value: T) -> Self {
        TextField::new(value)
    }
}

impl<T: TextCodec> Serialize for TextField<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.source {
            Some(source) => source.serialize(serializer),
            None => self.value.encode().serialize(serializer),
        }
    }
}

impl<'de, T: TextCodec> Deserialize<'de> for TextField<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = Value::deserialize(deserializer)?;
        match T::decode(&source) {
            Some(value) => Ok(TextField {
                value,
                source: Some(source),
            }),
            None => Err(de::Error::custom(format_args!(
                "expected {}, found {}",
                T::EXPECTED,
                source
            ))),
        }
    }
}

/// Crossover setting of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crossover {
    /// No crossover, the speaker plays the full range (`F`).
    FullRange,
    /// Crossover frequency in Hz.
    Frequency(u32),
    /// Any other token, written back unchanged.
    Other(String),
}

impl From<&str> for Crossover {
    fn from(token: &str) -> Self {
        let trimmed = token.trim();
        if trimmed.eq_ignore_ascii_case("F") {
            return Crossover::FullRange;
        }
        match trimmed.parse::<u32>() {
            Ok(hz) => Crossover::Frequency(hz),
            Err(_) => Crossover::Other(token.to_string()),
        }
    }
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crossover::FullRange => f.write_str("F"),
            Crossover::Frequency(hz) => write!(f, "{}", hz),
            Crossover::Other(token) => f.write_str(token),
        }
    }
}

impl TextCodec for Crossover {
    const EXPECTED: &'static str = "\"F\" or a crossover frequency";

    fn decode(value: &Value) -> Option<Self> {
        match value {
            Value::String(token) => Some(Crossover::from(token.as_str())),
            Value::Number(number) => Some(Crossover::from(number.to_string().as_str())),
            _ => None,
        }
    }

    fn encode(&self) -> Value {
        Value::String(self.to_string())
    }
}

/// Speaker size setting of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakerType {
    /// `L`
    Large,
    /// `S`
    Small,
    /// Any other token, written back unchanged.
    Other(String),
}

impl SpeakerType {
    pub fn as_str(&self) -> &str {
        match self {
            SpeakerType::Large => "L",
            SpeakerType::Small => "S",
            SpeakerType::Other(token) => token,
        }
    }
}

impl From<&str> for SpeakerType {
    fn from(token: &str) -> Self {
        match token {
            "L" => SpeakerType::Large,
            "S" => SpeakerType::Small,
            other => SpeakerType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SpeakerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TextCodec for SpeakerType {
    const EXPECTED: &'static str = "a speaker type string";

    fn decode(value: &Value) -> Option<Self> {
        value.as_str().map(SpeakerType::from)
    }

    fn encode(&self) -> Value {
        Value::String(self.as_str().to_string())
    }
}

/// One point of a channel's custom target curve, `{<frequency>, <gain>}`.
///
/// The text is kept as found; the numeric view is parsed on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCurvePoint(String);

impl TargetCurvePoint {
    pub fn new(frequency_hz: f64, gain_db: f64) -> Self {
        Self::from_tokens(&format_number(frequency_hz), &format_number(gain_db))
    }

    /// Build a point from the two columns of a filter text line, unchanged.
    pub fn from_tokens(frequency: &str, gain: &str) -> Self {
        TargetCurvePoint(format!("{{{}, {}}}", frequency, gain))
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    /// The two tokens between the braces.
    pub fn tokens(&self) -> Option<(&str, &str)> {
        let inner = self.0.trim().strip_prefix('{')?.strip_suffix('}')?;
        let (frequency, gain) = inner.split_once(',')?;
        if gain.contains(',') {
            return None;
        }
        Some((frequency.trim(), gain.trim()))
    }

    pub fn frequency_hz(&self) -> Option<f64> {
        self.tokens().and_then(|(frequency, _)| parse_number(frequency))
    }

    pub fn gain_db(&self) -> Option<f64> {
        self.tokens().and_then(|(_, gain)| parse_number(gain))
    }
}

impl fmt::Display for TargetCurvePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for TargetCurvePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TargetCurvePoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(TargetCurvePoint)
    }
}

/// Decode a field value taken out of a JSON object, naming the key on error.
pub(crate) fn decode_field<T, E>(key: &str, value: Value) -> Result<T, E>
where
    T: DeserializeOwned,
    E: de::Error,
{
    serde_json::from_value(value).map_err(|e| E::custom(format_args!("invalid `{}`: {}", key, e)))
}
