//! Results Record
//!
//! One [`Results`] is produced per runner invocation. Counters and errors are
//! updated while runs progress; `measurements` stays `None` until the merged
//! measurements are attached by [`Results::complete`].

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use inferbench_stats::Measurement;
use serde_json::{Map, Value};

/// Wire format of [`Results::started`]
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Outcome of all runs of all selected benchmarks
#[derive(Debug, Clone, PartialEq)]
pub struct Results {
    /// Runs per benchmark
    pub n_runs: u32,
    /// Benchmark names in execution order
    pub benchmarks: Vec<String>,
    /// Start time, UTC with millisecond precision
    pub started: DateTime<Utc>,
    /// One message per failed benchmark run
    pub errors: Vec<String>,
    /// Instance cap per run
    pub limit: Option<i64>,
    /// Wall-clock seconds, set on completion
    pub duration: Option<f64>,
    /// Environment label
    pub env: Option<String>,
    /// Device label
    pub device: Option<String>,
    /// Echo of the runner configuration
    pub options: Map<String, Value>,
    /// Completed benchmark runs
    pub successes: u64,
    /// Failed benchmark runs
    pub failures: u64,
    /// Merged measurements, set on completion
    pub measurements: Option<Vec<Measurement>>,
}

impl Results {
    /// Start a record now
    pub fn new(n_runs: u32, benchmarks: Vec<String>) -> Self {
        Self {
            n_runs,
            benchmarks,
            started: now_millis(),
            errors: Vec::new(),
            limit: None,
            duration: None,
            env: None,
            device: None,
            options: Map::new(),
            successes: 0,
            failures: 0,
            measurements: None,
        }
    }

    /// Whether merged measurements have been attached
    pub fn is_complete(&self) -> bool {
        self.measurements.is_some()
    }

    /// Count a completed run
    pub fn record_success(&mut self) {
        self.successes += 1;
    }

    /// Count a failed run and keep its message
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failures += 1;
        self.errors.push(message.into());
    }

    /// Attach duration and merged measurements
    pub fn complete(&mut self, duration: f64, measurements: Vec<Measurement>) {
        self.duration = Some(duration);
        self.measurements = Some(measurements);
    }

    /// Runs attempted so far
    pub fn attempts(&self) -> u64 {
        self.successes + self.failures
    }

    /// `started` in wire format
    pub fn started_string(&self) -> String {
        format_timestamp(&self.started)
    }
}

/// Current UTC time truncated to milliseconds
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Render a timestamp as `2024-05-01T12:30:45.123Z`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a wire timestamp; RFC 3339 with an offset is accepted too
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.fZ")
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc)))
        .ok()
}
