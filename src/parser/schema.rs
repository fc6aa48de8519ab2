//! Input schema for dissected frame records.
//!
//! tshark's `-T json -e <field>` output is an array of objects shaped like
//! `{"_source": {"layers": {"tcp.stream": ["3"], ...}}}`. Every attribute is
//! string valued; typed access goes through the helpers on [`RawFrame`].

use crate::utils::error::ParseError;
use chrono::TimeDelta;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

/// A single attribute value as emitted by the dissector
///
/// tshark emits a list per field; hand-written fixtures often use a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    List(Vec<String>),
    Single(String),
}

impl AttrValue {
    /// First value of the attribute, if any
    pub fn first(&self) -> Option<&str> {
        match self {
            AttrValue::List(values) => values.first().map(String::as_str),
            AttrValue::Single(value) => Some(value.as_str()),
        }
    }

    /// Whether the attribute carries any value at all
    pub fn is_present(&self) -> bool {
        match self {
            AttrValue::List(values) => !values.is_empty(),
            AttrValue::Single(value) => !value.is_empty(),
        }
    }
}

/// Attribute name -> value mapping for one frame
pub type Layers = HashMap<String, AttrValue>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub layers: Layers,
}

/// One frame record from the capture/dissection tool
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFrame {
    #[serde(rename = "_source", default)]
    pub source: RawSource,
}

impl RawFrame {
    /// Build a record from `(attribute, value)` pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let layers = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), AttrValue::List(vec![v.to_string()])))
            .collect();
        Self {
            source: RawSource { layers },
        }
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.source.layers.get(name)
    }

    /// First string value of an attribute
    pub fn text_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(AttrValue::first)
    }

    /// Attribute exists and is non-empty
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some_and(AttrValue::is_present)
    }

    /// Parse an integer attribute; absent attributes yield `None`
    pub fn int_attr<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, ParseError> {
        self.text_attr(name)
            .map(|value| {
                value.trim().parse::<T>().map_err(|_| ParseError::InvalidAttribute {
                    field: name,
                    value: value.to_string(),
                    expected: "integer",
                })
            })
            .transpose()
    }

    /// Parse a boolean attribute; absent attributes are false
    pub fn bool_attr(&self, name: &'static str) -> Result<bool, ParseError> {
        match self.text_attr(name) {
            Some(value) => parse_bool(value).ok_or_else(|| ParseError::InvalidAttribute {
                field: name,
                value: value.to_string(),
                expected: "boolean",
            }),
            None => Ok(false),
        }
    }

    /// Expert-info flags such as lost segments: present, non-empty and true
    ///
    /// Accepts booleans and integer counts (non-zero is true).
    pub fn flag_attr(&self, name: &'static str) -> Result<bool, ParseError> {
        let Some(value) = self.text_attr(name).map(str::trim) else {
            return Ok(false);
        };
        if value.is_empty() {
            return Ok(false);
        }
        if let Some(flag) = parse_bool(value) {
            return Ok(flag);
        }
        value
            .parse::<i64>()
            .map(|count| count != 0)
            .map_err(|_| ParseError::InvalidAttribute {
                field: name,
                value: value.to_string(),
                expected: "boolean or count",
            })
    }

    /// Parse fractional seconds since capture start
    pub fn seconds_attr(&self, name: &'static str) -> Result<Option<TimeDelta>, ParseError> {
        self.text_attr(name)
            .map(|value| {
                parse_seconds(value).ok_or_else(|| ParseError::InvalidAttribute {
                    field: name,
                    value: value.to_string(),
                    expected: "non-negative seconds",
                })
            })
            .transpose()
    }
}

/// Boolean spellings accepted by the dissector output
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_seconds(value: &str) -> Option<TimeDelta> {
    let seconds = value.trim().parse::<f64>().ok()?;
    let nanos = (seconds * 1e9).round();
    if !nanos.is_finite() || nanos < 0.0 || nanos >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::nanoseconds(nanos as i64))
}

/// Read every frame record from a JSON stream
///
/// The stream holds one array of records, or several arrays back to back.
pub fn read_frames(reader: impl Read) -> Result<Vec<RawFrame>, ParseError> {
    let mut frames = Vec::new();
    let stream = serde_json::Deserializer::from_reader(reader).into_iter::<Vec<RawFrame>>();

    for chunk in stream {
        let chunk = chunk?;
        debug!("Read chunk of {} frame records", chunk.len());
        frames.extend(chunk);
    }

    Ok(frames)
}
