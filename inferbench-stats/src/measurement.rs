//! Measurements
//!
//! A `Measurement` is one sample set tied to a [`MetricIdentity`]. Summary
//! statistics are derived from the normalized samples (`raw / per_run`) on
//! first access and cached together, so every accessor after the first is free.
//!
//! Dispersion is judged by the relative interquartile range
//! (`iqr / median`): at or above [`IQR_GROSS_WARN_THRESHOLD`] the measurement
//! carries an "environmental influence" warning, at or above
//! [`IQR_WARN_THRESHOLD`] a "system fluctuation" warning.

use crate::metric::MetricIdentity;
use crate::percentiles::{quartiles_sorted, sort_samples};
use serde_json::{Map, Value};
use std::num::NonZeroU32;
use std::sync::OnceLock;

/// Relative IQR at which a measurement is flagged as fluctuating
pub const IQR_WARN_THRESHOLD: f64 = 0.10;

/// Relative IQR at which a measurement is flagged as environmentally influenced
pub const IQR_GROSS_WARN_THRESHOLD: f64 = 0.25;

const GROSS_WARNING: &str = "This suggests significant environmental influence.";
const FLUCTUATION_WARNING: &str = "This could indicate system fluctuation.";

/// Summary statistics of a measurement's normalized samples
#[derive(Debug, Clone)]
pub struct Statistics {
    /// Normalized samples sorted ascending
    pub sorted: Vec<f64>,
    /// 50th percentile
    pub median: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// 25th percentile
    pub p25: f64,
    /// 75th percentile
    pub p75: f64,
    /// `p75 - p25`
    pub iqr: f64,
    /// `iqr / median`, 0 when the median is 0, NaN without samples
    pub relative_iqr: f64,
    /// Confidence warnings, at most one
    pub warnings: Vec<String>,
}

impl Statistics {
    fn undefined() -> Self {
        Self {
            sorted: Vec::new(),
            median: f64::NAN,
            mean: f64::NAN,
            p25: f64::NAN,
            p75: f64::NAN,
            iqr: f64::NAN,
            relative_iqr: f64::NAN,
            warnings: Vec::new(),
        }
    }

    fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::undefined();
        }

        let sorted = sort_samples(samples);
        let quartiles = quartiles_sorted(&sorted);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let iqr = quartiles.iqr();

        // A zero median would divide by zero; treat it as no dispersion.
        let relative_iqr = if quartiles.p50 == 0.0 {
            0.0
        } else {
            iqr / quartiles.p50
        };

        let mut warnings = Vec::new();
        if relative_iqr >= IQR_GROSS_WARN_THRESHOLD {
            warnings.push(iqr_warning(relative_iqr, GROSS_WARNING));
        } else if relative_iqr >= IQR_WARN_THRESHOLD {
            warnings.push(iqr_warning(relative_iqr, FLUCTUATION_WARNING));
        }

        Self {
            sorted,
            median: quartiles.p50,
            mean,
            p25: quartiles.p25,
            p75: quartiles.p75,
            iqr,
            relative_iqr,
            warnings,
        }
    }
}

fn iqr_warning(relative_iqr: f64, reason: &str) -> String {
    format!(
        "  WARNING: Interquartile range is {:.1}% of the median measurement.\n           {}",
        relative_iqr * 100.0,
        reason
    )
}

/// A set of timing samples for one metric
#[derive(Debug, Clone)]
pub struct Measurement {
    metric: MetricIdentity,
    raw_samples: Vec<f64>,
    per_run: NonZeroU32,
    units: Option<String>,
    metadata: Option<Map<String, Value>>,
    stats: OnceLock<Statistics>,
}

impl Measurement {
    /// Create a measurement with `per_run = 1` and no units or metadata
    pub fn new(metric: MetricIdentity, raw_samples: Vec<f64>) -> Self {
        Self {
            metric,
            raw_samples,
            per_run: NonZeroU32::MIN,
            units: None,
            metadata: None,
            stats: OnceLock::new(),
        }
    }

    /// Set the number of operations each raw sample covers
    pub fn with_per_run(mut self, per_run: NonZeroU32) -> Self {
        self.per_run = per_run;
        self.stats = OnceLock::new();
        self
    }

    /// Set the sample units, e.g. `"s"`
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Attach free-form metadata (not preserved by merge)
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The identity this measurement belongs to
    pub fn metric(&self) -> &MetricIdentity {
        &self.metric
    }

    /// Raw samples in collection order
    pub fn raw_samples(&self) -> &[f64] {
        &self.raw_samples
    }

    /// Divisor applied to each raw sample
    pub fn per_run(&self) -> NonZeroU32 {
        self.per_run
    }

    /// Sample units
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// Free-form metadata
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }

    /// Metric label
    pub fn label(&self) -> Option<&str> {
        self.metric.label.as_deref()
    }

    /// Metric sub-label
    pub fn sub_label(&self) -> Option<&str> {
        self.metric.sub_label.as_deref()
    }

    /// Metric description
    pub fn description(&self) -> Option<&str> {
        self.metric.description.as_deref()
    }

    /// Metric device
    pub fn device(&self) -> Option<&str> {
        self.metric.device.as_deref()
    }

    /// Metric environment
    pub fn env(&self) -> Option<&str> {
        self.metric.env.as_deref()
    }

    /// Metric title
    pub fn title(&self) -> String {
        self.metric.title()
    }

    /// Row name for tabular output: the sub-label or `[Unknown]`
    pub fn row_name(&self) -> &str {
        self.sub_label().unwrap_or("[Unknown]")
    }

    /// Environment name for tabular output
    pub fn env_name(&self) -> &str {
        self.env().unwrap_or("Unspecified env")
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.raw_samples.len()
    }

    /// Whether there are no samples
    pub fn is_empty(&self) -> bool {
        self.raw_samples.is_empty()
    }

    /// Raw samples divided by `per_run`
    pub fn normalized_samples(&self) -> Vec<f64> {
        let per_run = self.per_run.get() as f64;
        self.raw_samples.iter().map(|s| s / per_run).collect()
    }

    /// All summary statistics, computed on first access
    pub fn stats(&self) -> &Statistics {
        self.stats
            .get_or_init(|| Statistics::from_samples(&self.normalized_samples()))
    }

    /// Normalized samples sorted ascending
    pub fn sorted_samples(&self) -> &[f64] {
        &self.stats().sorted
    }

    /// Median of the normalized samples (NaN when empty)
    pub fn median(&self) -> f64 {
        self.stats().median
    }

    /// Mean of the normalized samples (NaN when empty)
    pub fn mean(&self) -> f64 {
        self.stats().mean
    }

    /// 25th percentile (NaN when empty)
    pub fn p25(&self) -> f64 {
        self.stats().p25
    }

    /// 75th percentile (NaN when empty)
    pub fn p75(&self) -> f64 {
        self.stats().p75
    }

    /// Interquartile range (NaN when empty)
    pub fn iqr(&self) -> f64 {
        self.stats().iqr
    }

    /// `iqr / median`
    pub fn relative_iqr(&self) -> f64 {
        self.stats().relative_iqr
    }

    /// Confidence warnings
    pub fn warnings(&self) -> &[String] {
        &self.stats().warnings
    }

    /// Whether any confidence warning applies
    pub fn has_warnings(&self) -> bool {
        !self.warnings().is_empty()
    }

    /// Whether the relative IQR is strictly below `threshold`.
    ///
    /// Always false for an empty measurement, always true when the median is 0.
    pub fn meets_confidence(&self, threshold: f64) -> bool {
        self.relative_iqr() < threshold
    }
}

impl PartialEq for Measurement {
    fn eq(&self, other: &Self) -> bool {
        self.metric == other.metric
            && self.raw_samples == other.raw_samples
            && self.per_run == other.per_run
            && self.units == other.units
            && self.metadata == other.metadata
    }
}
