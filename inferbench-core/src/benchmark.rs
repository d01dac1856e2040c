//! Benchmark Contract
//!
//! A benchmark plugin implements [`Benchmark`]: it is constructed from
//! [`BenchmarkOptions`], prepares its model and dataset in `setup`, yields
//! instances lazily, and splits each instance into a preprocess step and an
//! inference step. The runner only ever sees the object-safe
//! [`RunnableBenchmark`], which times those two steps.

use crate::error::BenchmarkError;
use crate::measure::Timer;
use inferbench_data::{ArtifactKind, CacheDir, DataError, MANIFEST_FILE, Manifest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Lazily produced benchmark instances
pub type InstanceIter<T> = Box<dyn Iterator<Item = Result<T, BenchmarkError>>>;

/// Options handed to every benchmark constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkOptions {
    /// Dataset cache home (falls back to `INFERBENCH_DATA`)
    pub data_home: Option<PathBuf>,
    /// Model cache home (falls back to `INFERBENCH_MODELS`)
    pub model_home: Option<PathBuf>,
    /// Use the `-sample` variant of each dataset
    pub use_sample: bool,
    /// Whether the caller shows progress
    pub progress: bool,
    /// Explicit datasets manifest
    pub datasets_manifest: Option<PathBuf>,
    /// Explicit models manifest
    pub models_manifest: Option<PathBuf>,
    /// Plugin-specific settings
    pub extra: BTreeMap<String, Value>,
    /// Datasets manifest loaded by [`BenchmarkOptions::load_manifests`]
    #[serde(skip)]
    pub datasets: Option<Arc<Manifest>>,
    /// Models manifest loaded by [`BenchmarkOptions::load_manifests`]
    #[serde(skip)]
    pub models: Option<Arc<Manifest>>,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            data_home: None,
            model_home: None,
            use_sample: true,
            progress: false,
            datasets_manifest: None,
            models_manifest: None,
            extra: BTreeMap::new(),
            datasets: None,
            models: None,
        }
    }
}

impl BenchmarkOptions {
    /// Resolve the dataset cache
    pub fn data_cache(&self) -> Result<CacheDir, BenchmarkError> {
        Ok(CacheDir::resolve(
            ArtifactKind::Dataset,
            self.data_home.as_deref(),
        )?)
    }

    /// Resolve the model cache
    pub fn model_cache(&self) -> Result<CacheDir, BenchmarkError> {
        Ok(CacheDir::resolve(ArtifactKind::Model, self.model_home.as_deref())?)
    }

    /// Load the datasets and models manifests once, ahead of any run.
    ///
    /// Explicit manifest paths must exist; otherwise `manifest.json` in each
    /// cache home is used when present. Failures are configuration errors.
    pub fn load_manifests(&mut self) -> Result<(), BenchmarkError> {
        let data_cache = self.data_cache()?;
        let model_cache = self.model_cache()?;

        self.datasets = load_manifest(
            ArtifactKind::Dataset,
            self.datasets_manifest.as_deref(),
            data_cache.root(),
        )?;
        self.models = load_manifest(
            ArtifactKind::Model,
            self.models_manifest.as_deref(),
            model_cache.root(),
        )?;
        Ok(())
    }

    /// Boolean plugin setting, `false` when absent
    pub fn flag(&self, key: &str) -> bool {
        self.extra.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Unsigned integer plugin setting
    pub fn integer(&self, key: &str) -> Option<u64> {
        self.extra.get(key).and_then(Value::as_u64)
    }
}

fn load_manifest(
    kind: ArtifactKind,
    explicit: Option<&Path>,
    home: &Path,
) -> Result<Option<Arc<Manifest>>, BenchmarkError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = home.join(MANIFEST_FILE);
            if !path.is_file() {
                return Ok(None);
            }
            path
        }
    };

    debug!(path = %path.display(), "loading {} manifest", kind.noun());
    match Manifest::load(kind, &path) {
        Ok(manifest) => Ok(Some(Arc::new(manifest))),
        Err(e @ DataError::Manifest { .. }) => Err(BenchmarkError::Configuration(e.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// A model-plus-dataset workload.
///
/// The runner drives a benchmark as
/// `new -> setup -> instances -> (preprocess -> infer)* -> teardown`,
/// calling `teardown` even when an earlier step failed.
pub trait Benchmark: Sized + 'static {
    /// Raw dataset item
    type Instance;
    /// Output of preprocessing, input of inference
    type Features;
    /// Inference result; discarded by the runner
    type Output;

    /// Human-readable summary
    const DESCRIPTION: &'static str;

    /// Construct without touching the filesystem or loading models
    fn new(options: &BenchmarkOptions) -> Result<Self, BenchmarkError>;

    /// Number of instances in the full dataset
    fn total(options: &BenchmarkOptions) -> Result<u64, BenchmarkError>;

    /// Load the model and locate the dataset
    fn setup(&mut self) -> Result<(), BenchmarkError>;

    /// Release resources; with `evict_cache` also delete cached artifacts
    fn teardown(&mut self, evict_cache: bool) -> Result<(), BenchmarkError>;

    /// Lazily yield at most `limit` instances
    fn instances(&self, limit: Option<i64>) -> Result<InstanceIter<Self::Instance>, BenchmarkError>;

    /// Turn one instance into model input
    fn preprocess(&mut self, instance: Self::Instance) -> Result<Self::Features, BenchmarkError>;

    /// Run the model on preprocessed input
    fn infer(&mut self, features: Self::Features) -> Result<Self::Output, BenchmarkError>;
}

/// Per-instance phase timings of one run, in seconds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseTimings {
    /// One sample per instance for the preprocess step
    pub preprocessing: Vec<f64>,
    /// One sample per instance for the inference step
    pub inferencing: Vec<f64>,
}

impl PhaseTimings {
    /// Number of timed instances
    pub fn len(&self) -> usize {
        self.preprocessing.len()
    }

    /// Whether no instance was timed
    pub fn is_empty(&self) -> bool {
        self.preprocessing.is_empty()
    }
}

/// Object-safe view of a [`Benchmark`] used by the runner
pub trait RunnableBenchmark {
    /// Human-readable summary
    fn description(&self) -> &'static str;

    /// See [`Benchmark::setup`]
    fn setup(&mut self) -> Result<(), BenchmarkError>;

    /// Iterate instances, timing preprocess and inference separately.
    ///
    /// `on_instance` fires after each completed instance. Any error aborts
    /// the run and discards its timings.
    fn run_timed(
        &mut self,
        limit: Option<i64>,
        on_instance: &mut dyn FnMut(),
    ) -> Result<PhaseTimings, BenchmarkError>;

    /// See [`Benchmark::teardown`]
    fn teardown(&mut self, evict_cache: bool) -> Result<(), BenchmarkError>;
}

impl<B: Benchmark> RunnableBenchmark for B {
    fn description(&self) -> &'static str {
        B::DESCRIPTION
    }

    fn setup(&mut self) -> Result<(), BenchmarkError> {
        Benchmark::setup(self)
    }

    fn run_timed(
        &mut self,
        limit: Option<i64>,
        on_instance: &mut dyn FnMut(),
    ) -> Result<PhaseTimings, BenchmarkError> {
        let mut timings = PhaseTimings::default();

        for instance in self.instances(limit)? {
            let instance = instance?;

            let mut timer = Timer::start();
            let features = self.preprocess(instance)?;
            let preprocessing = timer.lap();
            let output = self.infer(features)?;
            let inferencing = timer.lap();
            black_box(output);

            timings.preprocessing.push(preprocessing);
            timings.inferencing.push(inferencing);
            on_instance();
        }

        Ok(timings)
    }

    fn teardown(&mut self, evict_cache: bool) -> Result<(), BenchmarkError> {
        Benchmark::teardown(self, evict_cache)
    }
}
