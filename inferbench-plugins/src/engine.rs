//! Inference Engines
//!
//! Dataset-backed benchmarks delegate decoding and model execution to an
//! [`InferenceEngine`] linked in by model name with `inventory::submit!`.

use inferbench_core::BenchmarkError;
use inferbench_data::DatasetInstance;
use std::path::Path;

/// Dense model input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    /// Tensor dimensions
    pub shape: Vec<usize>,
    /// Row-major values
    pub data: Vec<f32>,
}

impl Features {
    /// Build features, checking that the shape covers the data
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, BenchmarkError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(BenchmarkError::Inference(format!(
                "feature shape {:?} does not match {} values",
                shape,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }
}

/// Model runtime for one model family
pub trait InferenceEngine {
    /// Decode and transform one dataset instance
    fn preprocess(&mut self, instance: &DatasetInstance) -> Result<Features, BenchmarkError>;

    /// Run the model
    fn infer(&mut self, features: Features) -> Result<Vec<f32>, BenchmarkError>;
}

/// Engine registered for a model name
#[derive(Debug, Clone, Copy)]
pub struct EngineEntry {
    /// Model name as it appears in the model cache
    pub model: &'static str,
    /// Load the engine from the cached model directory
    pub load: fn(&Path) -> Result<Box<dyn InferenceEngine>, BenchmarkError>,
}

inventory::collect!(EngineEntry);

/// Engine linked for `model`, if any
pub fn find_engine(model: &str) -> Option<&'static EngineEntry> {
    inventory::iter::<EngineEntry>
        .into_iter()
        .find(|entry| entry.model == model)
}
