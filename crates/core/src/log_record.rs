//! Error-log record model.
//!
//! Records are read from databases owned by our users, so their shape is not
//! under our control. A record is parsed from a JSON document field by field:
//! a sub-field that is missing or has the wrong type reads as `None` instead
//! of failing the whole record. Only a document that is not an object at all
//! is rejected (see [`ErrorLogRecord::from_document`]).
//!
//! Both the camelCase keys written by the browser SDK and the snake_case
//! column names of a relational `errors` table are accepted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One reported client-side error event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogRecord {
    /// Opaque identifier. Not guaranteed unique across records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub error_type: Option<String>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Normalized instant. Serialized as epoch milliseconds.
    #[serde(
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl ErrorLogRecord {
    /// Parse a record from a JSON document.
    ///
    /// Fails with [`CoreError::InvalidInput`] only when `doc` is not an
    /// object. Every field inside an object is optional.
    pub fn from_document(doc: &Value) -> Result<Self, CoreError> {
        let obj = doc.as_object().ok_or_else(|| {
            CoreError::InvalidInput(format!(
                "error log record must be a JSON object, got {}",
                json_kind(doc)
            ))
        })?;

        Ok(Self {
            id: field(obj, &["_id", "id"]).and_then(parse_id),
            error_type: field(obj, &["errorType", "error_type"]).and_then(as_string),
            message: field(obj, &["message"]).and_then(as_string),
            stack_trace: field(obj, &["stackTrace", "stack_trace", "stack"]).and_then(as_string),
            url: field(obj, &["url"]).and_then(as_string),
            timestamp: field(obj, &["timestamp"]).and_then(parse_timestamp),
            metadata: match field(obj, &["metadata"]) {
                Some(Value::Object(map)) => Some(Metadata::from_map(map)),
                _ => None,
            },
        })
    }
}

impl<'de> Deserialize<'de> for ErrorLogRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = Value::deserialize(deserializer)?;
        Self::from_document(&doc).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Context attached to a record by the reporting SDK.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceSample>,
    /// Passed through untouched for the detail view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_count: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Value>,
    /// Any other keys the SDK sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const METADATA_KEYS: &[&str] = &[
    "environment",
    "browser",
    "device",
    "performance",
    "duplicateCount",
    "duplicate_count",
    "resources",
    "timing",
];

impl Metadata {
    fn from_map(map: &Map<String, Value>) -> Self {
        let extra = map
            .iter()
            .filter(|(k, _)| !METADATA_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            environment: field(map, &["environment"]).and_then(as_string),
            browser: object(map, "browser").map(BrowserInfo::from_map),
            device: object(map, "device").map(DeviceInfo::from_map),
            performance: object(map, "performance").map(PerformanceSample::from_map),
            duplicate_count: field(map, &["duplicateCount", "duplicate_count"]).cloned(),
            resources: field(map, &["resources"]).cloned(),
            timing: field(map, &["timing"]).cloned(),
            extra,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl BrowserInfo {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            name: field(map, &["name"]).and_then(as_string),
            // SDKs report versions as "120.0" or as a bare number.
            version: field(map, &["version"]).and_then(as_text),
            platform: field(map, &["platform"]).and_then(as_string),
            language: field(map, &["language"]).and_then(as_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
}

impl DeviceInfo {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            device_type: field(map, &["type"]).and_then(as_string),
            screen_resolution: field(map, &["screenResolution", "screen_resolution"])
                .and_then(as_string),
            orientation: field(map, &["orientation"]).and_then(as_string),
        }
    }
}

/// Performance timings reported with the error. Keys keep the SDK's
/// snake_case spelling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xhr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_task: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<f64>,
}

impl PerformanceSample {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            xhr: field(map, &["xhr"]).and_then(Value::as_f64),
            fetch: field(map, &["fetch"]).and_then(Value::as_f64),
            long_task: field(map, &["long_task", "longTask"]).and_then(Value::as_f64),
            memory_usage: field(map, &["memory_usage", "memoryUsage"]).and_then(Value::as_f64),
        }
    }
}

// ---------------------------------------------------------------------------
// Timestamp normalization
// ---------------------------------------------------------------------------

/// Normalize a producer-specific timestamp representation to a UTC instant.
///
/// Accepts epoch milliseconds (integer, float or digit string), RFC 3339
/// strings, naive `YYYY-MM-DD[ T]HH:MM:SS[.f]` strings (read as UTC), bare
/// dates, and `{"$date": ...}` wrappers. Returns `None` for anything else.
pub fn parse_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(ms) => DateTime::from_timestamp_millis(ms),
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .and_then(|f| DateTime::from_timestamp_millis(f as i64)),
        },
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Object(map) => map
            .get("$date")
            .or_else(|| map.get("$numberLong"))
            .and_then(parse_timestamp),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<Timestamp> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis);
    }
    None
}

// ---------------------------------------------------------------------------
// Lenient field access
// ---------------------------------------------------------------------------

/// First present, non-null value among `keys`.
fn field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

fn object<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// Strings and numbers, rendered as text.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$oid").and_then(as_string),
        _ => None,
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
