#![warn(missing_docs)]
//! inferbench Statistical Model
//!
//! The data model shared by every other inferbench crate:
//! - [`MetricIdentity`], the grouping key describing what was measured
//! - [`Measurement`], a sample set with lazily computed, cached statistics
//!   and two-tier confidence warnings based on the relative IQR
//! - [`merge`], combining same-identity measurements from repeated runs
//! - Type-7 percentiles and duration unit selection for display

mod measurement;
mod merge;
mod metric;
mod percentiles;
mod units;

pub use measurement::{IQR_GROSS_WARN_THRESHOLD, IQR_WARN_THRESHOLD, Measurement, Statistics};
pub use merge::merge;
pub use metric::MetricIdentity;
pub use percentiles::{Quartiles, compute_percentile, quantile_sorted, quartiles_sorted, sort_samples};
pub use units::{format_duration, humanize_unit, select_duration_unit};

/// Units recorded for wall-clock timing samples
pub const SECONDS: &str = "s";
