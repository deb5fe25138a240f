// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Parser for the Tello state stream.
//!
//! The drone pushes datagrams of the form `key:value;key:value;...;`
//! at a fixed rate. This module turns one such datagram into a
//! [`TelemetryRecord`] and knows nothing about sockets or tasks, so it
//! is testable with string literals alone.

use serde::Serialize;
use thiserror::Error;

/// Keys the firmware reports as integers.
const INT_KEYS: &[&str] = &[
    "pitch", "roll", "yaw", "vgx", "vgy", "vgz", "templ", "temph", "tof", "h", "bat", "time",
    "mid", "x", "y", "z",
];

/// Keys the firmware reports as floats.
const FLOAT_KEYS: &[&str] = &["baro", "agx", "agy", "agz"];

/// A single telemetry field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for TelemetryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Error returned when a state datagram cannot be parsed.
///
/// A failed parse rejects the whole datagram; there are no partial
/// records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("state datagram contains no fields")]
    Empty,

    #[error("state segment '{segment}' has no ':' separator")]
    MissingSeparator { segment: String },

    #[error("state field '{key}' has non-numeric value '{value}'")]
    InvalidNumber { key: String, value: String },
}

/// One fully parsed state datagram, in wire order.
///
/// The record is replaced wholesale on every successful parse, so a
/// reader either sees the previous complete snapshot or the new one,
/// never a mix.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryRecord {
    fields: Vec<(String, TelemetryValue)>,
}

impl TelemetryRecord {
    /// Look up a field by its wire name.
    pub fn get(&self, key: &str) -> Option<&TelemetryValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Integer field by name, if present and integral.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            TelemetryValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float field by name. Integer fields coerce losslessly.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            TelemetryValue::Float(v) => Some(*v),
            TelemetryValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Battery charge percentage (`bat`).
    pub fn battery(&self) -> Option<i64> {
        self.get_int("bat")
    }

    /// Height above the takeoff point in cm (`h`).
    pub fn height(&self) -> Option<i64> {
        self.get_int("h")
    }

    /// Motor-on time in seconds (`time`).
    pub fn flight_time(&self) -> Option<i64> {
        self.get_int("time")
    }

    /// Detected mission pad id, `-1` when none (`mid`).
    pub fn mission_pad(&self) -> Option<i64> {
        self.get_int("mid")
    }

    /// Iterate fields in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TelemetryValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parse one raw state datagram.
///
/// Splits on `;`, then on the first `:` of each segment. The trailing
/// `;` the firmware always appends yields no spurious field. Known
/// numeric keys must parse as their numeric type or the whole datagram
/// is rejected; unknown keys keep the narrowest type their value
/// admits.
pub fn parse_state(raw: &str) -> Result<TelemetryRecord, ParseError> {
    let mut fields = Vec::new();

    for segment in raw.trim().split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((key, value)) = segment.split_once(':') else {
            return Err(ParseError::MissingSeparator {
                segment: segment.to_string(),
            });
        };
        let key = key.trim();
        let value = value.trim();
        fields.push((key.to_string(), parse_value(key, value)?));
    }

    if fields.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(TelemetryRecord { fields })
}

fn parse_value(key: &str, value: &str) -> Result<TelemetryValue, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    };

    if INT_KEYS.contains(&key) {
        return value.parse().map(TelemetryValue::Int).map_err(|_| invalid());
    }
    if FLOAT_KEYS.contains(&key) {
        return value
            .parse()
            .map(TelemetryValue::Float)
            .map_err(|_| invalid());
    }
    // Unknown key: infer the type from the value.
    if let Ok(v) = value.parse() {
        return Ok(TelemetryValue::Int(v));
    }
    if let Ok(v) = value.parse() {
        return Ok(TelemetryValue::Float(v));
    }
    Ok(TelemetryValue::Text(value.to_string()))
}
