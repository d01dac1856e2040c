//! Benchmark Runner
//!
//! Drives every selected benchmark through `runs` repetitions of its
//! lifecycle and turns the per-instance phase timings into merged
//! measurements.
//!
//! ## Pipeline Overview
//!
//! ```text
//! BenchmarkEntry (registered via inventory)
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  setup → timed instances → teardown, per run
//! └──────┬──────┘
//!        │  Measurement per phase per successful run
//!        ▼
//! ┌─────────────┐
//! │    merge    │  One Measurement per metric identity
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ statistics  │  Per-row summary stats (parallel)
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Human-readable output
//! └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - Lifecycle orchestration and failure accounting
//! - [`statistics`] - Parallel statistics computation
//! - [`formatting`] - Human-readable output formatting

mod execution;
mod formatting;
mod statistics;

pub use execution::{INFERENCING, PREPROCESSING};
pub use formatting::format_human_output;
pub use statistics::{RowSummary, compute_statistics};

use inferbench_core::{BenchmarkEntry, BenchmarkError, BenchmarkOptions};
use inferbench_report::{Results, save_results};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Configuration shared by every benchmark run
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Device label recorded with every measurement
    pub device: Option<String>,
    /// Environment label recorded with every measurement
    pub env: Option<String>,
    /// Runs per benchmark
    pub runs: u32,
    /// Instance cap per run
    pub limit: Option<i64>,
    /// Options passed to every benchmark constructor
    pub options: BenchmarkOptions,
    /// Evict cached artifacts after the last run of each benchmark
    pub cleanup: bool,
    /// Log a summary when the runner completes
    pub verbose: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            device: None,
            env: None,
            runs: 1,
            limit: None,
            options: BenchmarkOptions::default(),
            cleanup: true,
            verbose: false,
        }
    }
}

impl RunnerConfig {
    /// Configuration echo stored in [`Results::options`]
    pub fn echo(&self) -> Result<Map<String, Value>, BenchmarkError> {
        let mut echo = match serde_json::to_value(&self.options) {
            Ok(Value::Object(options)) => options,
            Ok(_) => Map::new(),
            Err(e) => {
                return Err(BenchmarkError::Configuration(format!(
                    "cannot record benchmark options: {}",
                    e
                )));
            }
        };
        echo.insert("cleanup".into(), self.cleanup.into());
        Ok(echo)
    }
}

/// Runner lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Constructed, not yet run
    Idle,
    /// Executing benchmarks
    Running,
    /// Results are available
    Complete,
}

/// Runs a fixed set of benchmarks and keeps their results
pub struct BenchmarkRunner {
    benchmarks: Vec<BenchmarkEntry>,
    config: RunnerConfig,
    state: RunnerState,
    results: Option<Results>,
}

impl BenchmarkRunner {
    /// Create a runner.
    ///
    /// Manifests are loaded here, once, when any selected benchmark needs
    /// them; a broken manifest is a configuration error.
    pub fn new(benchmarks: Vec<BenchmarkEntry>, mut config: RunnerConfig) -> Result<Self, BenchmarkError> {
        let mut seen = HashSet::new();
        for benchmark in &benchmarks {
            if !seen.insert(benchmark.name.to_lowercase()) {
                return Err(BenchmarkError::Configuration(format!(
                    "benchmark {} is selected more than once",
                    benchmark.name
                )));
            }
        }

        if benchmarks.iter().any(|b| b.requires_manifest) {
            config.options.load_manifests()?;
        }

        Ok(Self {
            benchmarks,
            config,
            state: RunnerState::Idle,
            results: None,
        })
    }

    /// Runner configuration
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Benchmark names in execution order
    pub fn benchmarks(&self) -> Vec<&'static str> {
        self.benchmarks.iter().map(|b| b.name).collect()
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Whether results are available
    pub fn is_complete(&self) -> bool {
        self.state == RunnerState::Complete
    }

    /// Results of the last completed run
    pub fn results(&self) -> Option<&Results> {
        self.results.as_ref().filter(|_| self.is_complete())
    }

    /// Run every benchmark `runs` times.
    ///
    /// Run-scoped failures are recorded in the results; any other error
    /// aborts the batch and returns the runner to idle.
    pub fn run(&mut self) -> Result<&Results, BenchmarkError> {
        self.state = RunnerState::Running;
        self.results = None;

        match execution::execute(&self.benchmarks, &self.config) {
            Ok(results) => {
                self.state = RunnerState::Complete;
                Ok(self.results.insert(results))
            }
            Err(e) => {
                self.state = RunnerState::Idle;
                Err(e)
            }
        }
    }

    /// Write the results as a tagged JSON document.
    ///
    /// Fails with [`BenchmarkError::Benchmark`] until a run has completed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BenchmarkError> {
        let path = path.as_ref();
        let results = self.results().ok_or_else(|| {
            BenchmarkError::Benchmark("cannot save results before the runner has completed".into())
        })?;
        save_results(results, path)?;

        if self.config.verbose {
            println!("benchmark results saved to {}", path.display());
        }
        info!(path = %path.display(), "saved benchmark results");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inferbench_core::{Benchmark, InstanceIter};

    struct Counting;

    impl Benchmark for Counting {
        type Instance = u32;
        type Features = u32;
        type Output = u32;

        const DESCRIPTION: &'static str = "counts to five";

        fn new(_options: &BenchmarkOptions) -> Result<Self, BenchmarkError> {
            Ok(Counting)
        }
        fn total(_options: &BenchmarkOptions) -> Result<u64, BenchmarkError> {
            Ok(5)
        }
        fn setup(&mut self) -> Result<(), BenchmarkError> {
            Ok(())
        }
        fn teardown(&mut self, _evict_cache: bool) -> Result<(), BenchmarkError> {
            Ok(())
        }
        fn instances(&self, limit: Option<i64>) -> Result<InstanceIter<u32>, BenchmarkError> {
            Ok(Box::new(inferbench_core::limit_instances(0..5, limit).map(Ok)))
        }
        fn preprocess(&mut self, instance: u32) -> Result<u32, BenchmarkError> {
            Ok(instance + 1)
        }
        fn infer(&mut self, features: u32) -> Result<u32, BenchmarkError> {
            Ok(features * 2)
        }
    }

    fn config(runs: u32) -> RunnerConfig {
        RunnerConfig {
            runs,
            device: Some("cpu".into()),
            ..RunnerConfig::default()
        }
    }

    #[test]
    fn test_state_machine() {
        let mut runner =
            BenchmarkRunner::new(vec![BenchmarkEntry::of::<Counting>("counting")], config(2)).unwrap();
        assert_eq!(runner.state(), RunnerState::Idle);
        assert!(runner.results().is_none());

        let results = runner.run().unwrap();
        assert_eq!(results.successes, 2);
        assert_eq!(runner.state(), RunnerState::Complete);

        let results = runner.results().unwrap();
        let measurements = results.measurements.as_ref().unwrap();
        assert_eq!(measurements.len(), 2);
        assert_eq!(measurements[0].sub_label(), Some(PREPROCESSING));
        assert_eq!(measurements[1].sub_label(), Some(INFERENCING));
        assert_eq!(measurements[0].len(), 10);
        assert_eq!(measurements[0].device(), Some("cpu"));
        assert_eq!(measurements[0].description(), Some("counts to five"));
    }

    #[test]
    fn test_duplicate_selection_rejected() {
        let entry = BenchmarkEntry::of::<Counting>("counting");
        let err = BenchmarkRunner::new(vec![entry, entry], config(1)).err().unwrap();
        assert!(matches!(err, BenchmarkError::Configuration(_)));
    }

    #[test]
    fn test_save_requires_completion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let mut runner =
            BenchmarkRunner::new(vec![BenchmarkEntry::of::<Counting>("counting")], config(1)).unwrap();

        let err = runner.save(&path).unwrap_err();
        assert!(matches!(err, BenchmarkError::Benchmark(_)));
        assert!(!path.exists());

        runner.run().unwrap();
        runner.save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_reports_serialization_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, b"file").unwrap();

        let mut runner =
            BenchmarkRunner::new(vec![BenchmarkEntry::of::<Counting>("counting")], config(1)).unwrap();
        runner.run().unwrap();

        let err = runner.save(blocker.join("results.json")).unwrap_err();
        assert!(matches!(err, BenchmarkError::Serialization(_)));
    }

    #[test]
    fn test_options_echo() {
        let echo = config(1).echo().unwrap();
        assert_eq!(echo["use_sample"], true);
        assert_eq!(echo["cleanup"], true);
    }
}
