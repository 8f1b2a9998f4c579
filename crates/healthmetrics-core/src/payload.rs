// ABOUTME: Tagged accessors over open provider JSON attribute maps
// ABOUTME: Distinguishes absent values from present zeros and never coerces types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Provider payloads are open attribute maps. Instead of deserializing them
//! into fixed structs, callers read fields through [`Payload`], which reports
//! each field as a [`PayloadValue`] and keeps "not reported" separate from
//! "reported as zero".

use serde_json::{Map, Value};

/// The shape of one field in a provider payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadValue<'a> {
    /// JSON string
    Text(&'a str),
    /// JSON number
    Number(f64),
    /// JSON boolean
    Flag(bool),
    /// JSON object
    Nested(Payload<'a>),
    /// Key missing, null, or an array
    Absent,
}

impl<'a> PayloadValue<'a> {
    fn from_json(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self::Text(s),
            Some(Value::Number(n)) => n.as_f64().map_or(Self::Absent, Self::Number),
            Some(Value::Bool(b)) => Self::Flag(*b),
            Some(Value::Object(map)) => Self::Nested(Payload::new(map)),
            Some(Value::Null | Value::Array(_)) | None => Self::Absent,
        }
    }

    /// Whether the field was reported at all
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Read-only view over a JSON object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Payload<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Payload<'a> {
    /// Wrap an attribute map
    #[must_use]
    pub const fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// Underlying map
    #[must_use]
    pub const fn as_map(&self) -> &'a Map<String, Value> {
        self.map
    }

    /// Tagged value for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> PayloadValue<'a> {
        PayloadValue::from_json(self.map.get(key))
    }

    /// Non-empty string value
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&'a str> {
        match self.get(key) {
            PayloadValue::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Numeric value, `None` when not reported or not a number
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            PayloadValue::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Boolean value, `false` unless the payload says `true`
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), PayloadValue::Flag(true))
    }

    /// Nested object
    #[must_use]
    pub fn nested(&self, key: &str) -> Option<Self> {
        match self.get(key) {
            PayloadValue::Nested(p) => Some(p),
            _ => None,
        }
    }

    /// Identifier rendered as text
    ///
    /// Strings are used as-is, numbers are rendered as integers
    /// (`12345.0` becomes `"12345"`). Anything else yields `None`.
    #[must_use]
    pub fn identifier(&self, key: &str) -> Option<String> {
        match self.map.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(|i| i.to_string())
                .or_else(|| n.as_u64().map(|u| u.to_string()))
                .or_else(|| n.as_f64().map(|f| (f.trunc() as i64).to_string())),
            _ => None,
        }
    }
}
