//! Error-insights aggregation.
//!
//! [`aggregate`] turns a batch of [`ErrorLogRecord`]s into the summary the
//! dashboard charts render: counts per error type, environment, browser and
//! device, a per-day time series, and two averaged performance timings.
//!
//! The pass is single, pure and never fails on record contents. Absent or
//! malformed fields fall back to fixed labels (or 0 for timings) at this
//! point, not at parse time, so the raw record still shows what was sent.
//!
//! Labels are grouped verbatim: `"NetworkError"` and `"networkerror"` are two
//! buckets, and records sharing an id are each counted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::log_record::ErrorLogRecord;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Bucket for records without an error type.
pub const UNKNOWN_ERROR_TYPE: &str = "Unknown";

/// Bucket for records without an environment or device type.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Browser name used when the SDK did not report one.
pub const UNKNOWN_BROWSER: &str = "Unknown";

/// Date format of time-series buckets (UTC calendar day).
pub const DAY_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Aggregated summary of a batch of error records.
///
/// Field names are part of the dashboard contract and serialize in
/// camelCase (`totalErrors`, `errorTypes`, `timeSeries`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInsights {
    pub total_errors: u64,
    pub error_types: BTreeMap<String, u64>,
    pub environments: BTreeMap<String, u64>,
    /// Keyed by `"{name} {version}"`.
    pub browsers: BTreeMap<String, u64>,
    pub devices: BTreeMap<String, u64>,
    /// One entry per distinct UTC day, ascending.
    pub time_series: Vec<TimeSeriesPoint>,
    pub performance_metrics: PerformanceSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub count: u64,
}

/// Mean timings across all records in the batch.
///
/// `avg_load_time` averages `performance.fetch` and `avg_response_time`
/// averages `performance.long_task`. Existing dashboards read these exact
/// fields under these names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub avg_load_time: f64,
    pub avg_response_time: f64,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tally {
    records: u64,
    error_types: BTreeMap<String, u64>,
    environments: BTreeMap<String, u64>,
    browsers: BTreeMap<String, u64>,
    devices: BTreeMap<String, u64>,
    days: BTreeMap<String, u64>,
    total_load_time: f64,
    total_response_time: f64,
}

impl Tally {
    fn add(&mut self, record: &ErrorLogRecord) {
        self.records += 1;
        bump(&mut self.error_types, error_type_label(record));
        bump(&mut self.environments, environment_label(record));
        bump(&mut self.browsers, &browser_label(record));
        bump(&mut self.devices, device_label(record));
        if let Some(day) = day_label(record) {
            bump(&mut self.days, &day);
        }
        let (load, response) = timings(record);
        self.total_load_time += load;
        self.total_response_time += response;
    }

    fn finish(self) -> ErrorInsights {
        let performance_metrics = if self.records == 0 {
            PerformanceSummary::default()
        } else {
            let n = self.records as f64;
            PerformanceSummary {
                avg_load_time: self.total_load_time / n,
                avg_response_time: self.total_response_time / n,
            }
        };

        // BTreeMap iterates in key order, which for `YYYY-MM-DD` is
        // chronological.
        let time_series = self
            .days
            .into_iter()
            .map(|(date, count)| TimeSeriesPoint { date, count })
            .collect();

        ErrorInsights {
            total_errors: self.records,
            error_types: self.error_types,
            environments: self.environments,
            browsers: self.browsers,
            devices: self.devices,
            time_series,
            performance_metrics,
        }
    }
}

fn bump(map: &mut BTreeMap<String, u64>, key: &str) {
    match map.get_mut(key) {
        Some(count) => *count += 1,
        None => {
            map.insert(key.to_string(), 1);
        }
    }
}

/// Aggregate a batch of records in a single pass.
///
/// Records may arrive in any order; the time series is always ascending.
/// An empty slice yields [`ErrorInsights::default`].
pub fn aggregate(records: &[ErrorLogRecord]) -> ErrorInsights {
    let mut tally = Tally::default();
    for record in records {
        tally.add(record);
    }
    tally.finish()
}

/// Parse raw documents and aggregate them.
///
/// Fails fast with [`CoreError::InvalidInput`] if any document is not an
/// object: that is an integration bug upstream and must not be reported as
/// "zero errors".
pub fn aggregate_documents(docs: &[Value]) -> Result<ErrorInsights, CoreError> {
    let records = docs
        .iter()
        .map(ErrorLogRecord::from_document)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(aggregate(&records))
}

// ---------------------------------------------------------------------------
// Label derivation
// ---------------------------------------------------------------------------

pub fn error_type_label(record: &ErrorLogRecord) -> &str {
    record.error_type.as_deref().unwrap_or(UNKNOWN_ERROR_TYPE)
}

pub fn environment_label(record: &ErrorLogRecord) -> &str {
    record
        .metadata
        .as_ref()
        .and_then(|m| m.environment.as_deref())
        .unwrap_or(UNKNOWN_LABEL)
}

/// `"{name} {version}"` with `"Unknown"` / `""` standing in for missing parts.
pub fn browser_label(record: &ErrorLogRecord) -> String {
    let browser = record.metadata.as_ref().and_then(|m| m.browser.as_ref());
    let name = browser
        .and_then(|b| b.name.as_deref())
        .unwrap_or(UNKNOWN_BROWSER);
    let version = browser.and_then(|b| b.version.as_deref()).unwrap_or("");
    format!("{name} {version}")
}

pub fn device_label(record: &ErrorLogRecord) -> &str {
    record
        .metadata
        .as_ref()
        .and_then(|m| m.device.as_ref())
        .and_then(|d| d.device_type.as_deref())
        .unwrap_or(UNKNOWN_LABEL)
}

/// UTC calendar day of the record, if its timestamp parsed.
pub fn day_label(record: &ErrorLogRecord) -> Option<String> {
    record
        .timestamp
        .map(|ts| ts.format(DAY_FORMAT).to_string())
}

/// `(fetch, long_task)`, each 0 when absent.
fn timings(record: &ErrorLogRecord) -> (f64, f64) {
    let perf = record.metadata.as_ref().and_then(|m| m.performance.as_ref());
    (
        perf.and_then(|p| p.fetch).unwrap_or(0.0),
        perf.and_then(|p| p.long_task).unwrap_or(0.0),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
