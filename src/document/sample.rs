//! Response samples
//!
//! A sample keeps the exact token found in the ady document so exported
//! text files reproduce it byte for byte. The numeric view is only computed
//! when a caller needs it (frequency analysis).

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// JSON type a sample was read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repr {
    Text,
    Integer,
    Float,
}

/// One value of an impulse response or curve filter.
///
/// Two samples are equal when their tokens are.
#[derive(Debug, Clone)]
pub struct Sample {
    token: String,
    repr: Repr,
}

impl Sample {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Sample {
            token: token.into(),
            repr: Repr::Text,
        }
    }

    /// The token as stored in the document.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Numeric value of the token, if it is a finite number.
    pub fn value(&self) -> Option<f64> {
        self.token
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }
}

impl PartialEq for Sample {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for Sample {}

impl Hash for Sample {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token.hash(state);
    }
}

impl From<&str> for Sample {
    fn from(token: &str) -> Self {
        Sample::new(token)
    }
}

impl From<String> for Sample {
    fn from(token: String) -> Self {
        Sample::new(token)
    }
}

impl From<f64> for Sample {
    fn from(value: f64) -> Self {
        Sample::new(value.to_string())
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

impl Serialize for Sample {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Samples loaded as JSON numbers are written back as numbers
        match self.repr {
            Repr::Integer => {
                if let Ok(v) = self.token.parse::<i64>() {
                    return serializer.serialize_i64(v);
                }
                if let Ok(v) = self.token.parse::<u64>() {
                    return serializer.serialize_u64(v);
                }
            }
            Repr::Float => {
                if let Ok(v) = self.token.parse::<f64>() {
                    return serializer.serialize_f64(v);
                }
            }
            Repr::Text => {}
        }
        serializer.serialize_str(&self.token)
    }
}

impl<'de> Deserialize<'de> for Sample {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SampleVisitor)
    }
}

struct SampleVisitor;

impl SampleVisitor {
    fn number(token: String, repr: Repr) -> Sample {
        Sample { token, repr }
    }
}

impl<'de> Visitor<'de> for SampleVisitor {
    type Value = Sample;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sample value as a string or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Sample, E> {
        Ok(Sample::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Sample, E> {
        Ok(Sample::new(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Sample, E> {
        Ok(Self::number(v.to_string(), Repr::Integer))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Sample, E> {
        Ok(Self::number(v.to_string(), Repr::Integer))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Sample, E> {
        Ok(Self::number(v.to_string(), Repr::Float))
    }
}
