#![warn(missing_docs)]
//! # inferbench
//!
//! Inference benchmarking harness with robust statistics and run merging.
//!
//! inferbench times model workloads phase by phase and reports summaries that
//! hold up across repeated runs:
//! - **Uniform lifecycle**: every plugin is driven through setup, a timed
//!   preprocess/infer loop and a teardown that always runs
//! - **Run merging**: samples from repeated runs are merged per metric identity
//! - **Robust statistics**: type-7 quartiles, IQR and confidence warnings
//! - **Failure isolation**: a failed run is recorded and the batch carries on
//! - **Self-describing results**: tagged JSON that round-trips exactly
//!
//! ## Quick Start
//!
//! ```ignore
//! use inferbench::prelude::*;
//!
//! let plan = build_plan(registered().into_iter().copied(), &["dot-bmm".into()], &[], &[])?;
//! let mut runner = BenchmarkRunner::new(plan.benchmarks, RunnerConfig::default())?;
//! let results = runner.run()?;
//! println!("{}", format_human_output(results));
//! ```
//!
//! ## Custom Benchmarks
//!
//! ```ignore
//! inferbench::internal::inventory::submit! {
//!     inferbench::BenchmarkEntry::of::<MyBenchmark>("my-benchmark")
//! }
//! ```

// Re-export core types
pub use inferbench_core::{
    Benchmark, BenchmarkEntry, BenchmarkError, BenchmarkOptions, DEVICE_CHOICES, Device,
    DeviceError, InstanceIter, PhaseTimings, RunnableBenchmark, Timer, find_benchmark,
    limit_instances, registered,
};

// Re-export stats
pub use inferbench_stats::{
    Measurement, MetricIdentity, SECONDS, format_duration, merge, select_duration_unit,
};

// Re-export data access
pub use inferbench_data::{
    ArtifactKind, CacheDir, DataError, DatasetInstance, DatasetSpec, Manifest, get_data_home,
    get_model_home,
};

// Re-export results and serialization
pub use inferbench_report::{
    OutputFormat, Record, Results, SerializationError, Tagged, decode, decode_any, dump, dumps,
    encode, load, load_results, loads, save_results,
};

// Re-export the runner
pub use inferbench_cli::{
    BenchmarkRunner, InferConfig, RunnerConfig, RunnerState, build_plan, format_human_output,
    resolve_exclude,
};

// Re-export plugin extension points
pub use inferbench_plugins::{BUILTINS, EngineEntry, Features, InferenceEngine};

/// Internal re-exports for plugin registration
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Benchmark, BenchmarkEntry, BenchmarkError, BenchmarkOptions, BenchmarkRunner,
        InstanceIter, Measurement, Results, RunnerConfig, build_plan, format_human_output,
        registered,
    };
}

/// Keeps the built-in plugin registrations linked into every binary
#[used]
#[doc(hidden)]
pub static PLUGINS_ANCHOR: &[&str] = &inferbench_plugins::BUILTINS;

/// Run the inferbench CLI.
///
/// Call this from a binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     inferbench::run()
/// }
/// ```
pub use inferbench_cli::run;
