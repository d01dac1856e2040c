//! Statistics Computation
//!
//! Parallel computation of display rows for merged measurements.
//!
//! Each measurement is summarized independently with Rayon:
//! - Central tendency (median, mean)
//! - Dispersion (IQR)
//! - A display unit chosen from the median
//! - Confidence warnings

use inferbench_stats::{Measurement, select_duration_unit};
use rayon::prelude::*;

/// One display row of a results table
#[derive(Debug, Clone, PartialEq)]
pub struct RowSummary {
    /// Benchmark label
    pub label: String,
    /// Phase, or `[Unknown]`
    pub sub_label: String,
    /// Number of samples
    pub samples: usize,
    /// Short display unit
    pub unit: &'static str,
    /// Seconds per display unit
    pub scale: f64,
    /// Median in seconds
    pub median: f64,
    /// Mean in seconds
    pub mean: f64,
    /// Interquartile range in seconds
    pub iqr: f64,
    /// Confidence warnings
    pub warnings: Vec<String>,
}

impl RowSummary {
    /// Value in display units
    pub fn scaled(&self, seconds: f64) -> f64 {
        seconds / self.scale
    }
}

/// Summarize measurements in parallel, preserving input order.
///
/// Empty measurements yield rows with undefined (NaN) statistics.
pub fn compute_statistics(measurements: &[Measurement]) -> Vec<RowSummary> {
    measurements
        .par_iter()
        .map(|m| {
            let (unit, scale) = select_duration_unit(m.median());
            RowSummary {
                label: m.label().unwrap_or_default().to_string(),
                sub_label: m.row_name().to_string(),
                samples: m.len(),
                unit,
                scale,
                median: m.median(),
                mean: m.mean(),
                iqr: m.iqr(),
                warnings: m.warnings().to_vec(),
            }
        })
        .collect()
}
