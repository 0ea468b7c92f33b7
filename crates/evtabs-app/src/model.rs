// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const EVENTS_KEY: &str = "Events";
pub const RAW_FIELDS_KEY: &str = "_rawDataFields";
pub const PLACEHOLDER_KEY: &str = "no data!";

const TIMESTAMP_KEYS: [&str; 4] = ["Timestamp", "timestamp", "_time", "time"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(usize);

impl EventId {
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

/// A primitive field value as it arrived on the wire.
///
/// Matching and display always go through the text form, so a number and
/// the string spelling of that number are interchangeable for search.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(Number),
    Bool(bool),
    Null,
}

impl FieldValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text.clone()),
            Value::Number(number) => Self::Number(number.clone()),
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Null => Self::Null,
            nested => Self::Text(nested.to_string()),
        }
    }

    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Number(number) => Cow::Owned(number_text(number)),
            Self::Bool(true) => Cow::Borrowed("true"),
            Self::Bool(false) => Cow::Borrowed("false"),
            Self::Null => Cow::Borrowed("null"),
        }
    }
}

/// Integers print as-is; floats print the way JavaScript's `String(n)`
/// does, so `1.0` is `1` and `1e21` is `1e+21`.
fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(value) if number.is_f64() => js_float_text(value),
        _ => number.to_string(),
    }
}

fn js_float_text(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{sign}Infinity");
    }
    if value == 0.0 {
        return "0".to_owned();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `1.5e-7`.
    let scientific = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };
    let digits = mantissa.replace('.', "");
    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (whole, fraction) = digits.split_at(n as usize);
        format!("{whole}.{fraction}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat(n.unsigned_abs() as usize))
    } else {
        let (lead, rest) = digits.split_at(1);
        let mantissa = if rest.is_empty() {
            lead.to_owned()
        } else {
            format!("{lead}.{rest}")
        };
        let sign = if n - 1 < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{}", (n - 1).unsigned_abs())
    };

    if value < 0.0 {
        format!("-{body}")
    } else {
        body
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    Parsed(OffsetDateTime),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Option<EventTime>,
    /// Field pairs in document order.
    pub raw_fields: Vec<(String, FieldValue)>,
}

impl Event {
    pub fn new(id: EventId, raw_fields: Vec<(String, FieldValue)>) -> Self {
        Self {
            id,
            timestamp: None,
            raw_fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub key: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub key: String,
    pub value: FieldValue,
    pub is_favorite: bool,
}

impl ListItem {
    pub fn placeholder() -> Self {
        Self {
            key: PLACEHOLDER_KEY.to_owned(),
            value: FieldValue::Text(String::new()),
            is_favorite: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.key == PLACEHOLDER_KEY && self.value == FieldValue::Text(String::new())
    }
}

pub fn parse_payload(raw: &str) -> Result<Vec<Event>> {
    let payload: Value = serde_json::from_str(raw).context("decode payload JSON")?;
    events_from_payload(&payload)
}

/// Reads the `Events` array of a payload.
///
/// The whole payload is rejected when any event is malformed; callers
/// never see a partial event list.
pub fn events_from_payload(payload: &Value) -> Result<Vec<Event>> {
    let events = payload
        .get(EVENTS_KEY)
        .ok_or_else(|| anyhow!("payload has no top-level `{EVENTS_KEY}` array"))?;
    let Some(events) = events.as_array() else {
        bail!(
            "payload `{EVENTS_KEY}` must be an array, got {}",
            json_kind(events)
        );
    };

    events
        .iter()
        .enumerate()
        .map(|(index, event)| event_from_json(index, event))
        .collect()
}

fn event_from_json(index: usize, value: &Value) -> Result<Event> {
    let Some(object) = value.as_object() else {
        bail!("event {index} must be an object, got {}", json_kind(value));
    };
    let raw = object
        .get(RAW_FIELDS_KEY)
        .ok_or_else(|| anyhow!("event {index} is missing `{RAW_FIELDS_KEY}`"))?;
    let Some(raw) = raw.as_object() else {
        bail!(
            "event {index} `{RAW_FIELDS_KEY}` must be an object, got {}",
            json_kind(raw)
        );
    };

    let raw_fields = raw
        .iter()
        .map(|(key, value)| (key.clone(), FieldValue::from_json(value)))
        .collect();

    Ok(Event {
        id: EventId::new(index),
        timestamp: event_time(object),
        raw_fields,
    })
}

fn event_time(object: &Map<String, Value>) -> Option<EventTime> {
    let raw = TIMESTAMP_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))?;
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(parsed) => Some(EventTime::Parsed(parsed)),
        Err(_) => Some(EventTime::Raw(raw.to_owned())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
