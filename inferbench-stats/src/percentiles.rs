//! Percentile Computation
//!
//! Quantiles use linear interpolation between order statistics (the "type 7"
//! definition): for `n` sorted samples the `q`-quantile sits at rank
//! `q * (n - 1)`, interpolated between the two neighbouring samples.

use std::cmp::Ordering;

/// Quartiles of a sample set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    /// 25th percentile
    pub p25: f64,
    /// 50th percentile (median)
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
}

impl Quartiles {
    /// Interquartile range, `p75 - p25`
    pub fn iqr(&self) -> f64 {
        self.p75 - self.p25
    }
}

/// Sort samples ascending. NaN values sort as equal to their neighbours.
pub fn sort_samples(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Compute a single quantile from samples that are already sorted ascending.
///
/// `quantile` is in `[0, 1]`. Returns `NaN` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], quantile: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = quantile.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower_idx = rank.floor() as usize;
            let upper_idx = (lower_idx + 1).min(n - 1);
            let fraction = rank - lower_idx as f64;

            sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
        }
    }
}

/// Compute a single percentile (`0..=100`) from unsorted samples
///
/// # Examples
///
/// ```
/// # use inferbench_stats::compute_percentile;
/// let samples = vec![5.0, 1.0, 3.0, 2.0, 4.0];
/// assert_eq!(compute_percentile(&samples, 50.0), 3.0);
/// ```
pub fn compute_percentile(samples: &[f64], percentile: f64) -> f64 {
    quantile_sorted(&sort_samples(samples), percentile / 100.0)
}

/// Compute quartiles from samples that are already sorted ascending
pub fn quartiles_sorted(sorted: &[f64]) -> Quartiles {
    Quartiles {
        p25: quantile_sorted(sorted, 0.25),
        p50: quantile_sorted(sorted, 0.50),
        p75: quantile_sorted(sorted, 0.75),
    }
}
