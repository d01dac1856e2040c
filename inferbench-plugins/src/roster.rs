//! Model Benchmarks
//!
//! Each benchmark pairs one cached model with one cached dataset. The model
//! step runs through the [`InferenceEngine`] linked for the model; without
//! one, `setup` fails with a models error and the run is recorded as failed.

use crate::engine::{Features, InferenceEngine, find_engine};
use inferbench_core::{Benchmark, BenchmarkError, BenchmarkOptions, InstanceIter, limit_instances};
use inferbench_data::{
    CacheDir, DatasetInstance, DatasetSpec, InstanceFormat, cleanup_dataset, cleanup_model,
    count_instances, find_model_path, load_dataset, verify_archive,
};
use std::marker::PhantomData;
use tracing::{debug, info};

/// Static description of a model benchmark
pub trait ModelWorkload: 'static {
    /// Model directory name in the model cache
    const MODEL: &'static str;
    /// Dataset the model is benchmarked against
    const DATASET: DatasetSpec;
    /// Human-readable summary
    const DESCRIPTION: &'static str;
}

macro_rules! workload {
    ($(#[$doc:meta])* $ty:ident, $model:literal, $dataset:literal, $format:expr, $description:literal) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $ty;

        impl ModelWorkload for $ty {
            const MODEL: &'static str = $model;
            const DATASET: DatasetSpec = DatasetSpec {
                name: $dataset,
                format: $format,
            };
            const DESCRIPTION: &'static str = $description;
        }
    };
}

const WAV: InstanceFormat = InstanceFormat::Files { extension: None };
const PNG: InstanceFormat = InstanceFormat::Files { extension: Some("png") };
const JPG: InstanceFormat = InstanceFormat::Files { extension: Some("jpg") };

workload!(
    /// Speech to text on regional UK accents
    Whisper, "whisper", "dialects", WAV,
    "utilizes the whisper-tiny english model to transcribe audio from various UK dialects"
);
workload!(
    /// Low-light image enhancement
    LowLight, "lowlight", "lowlight", PNG,
    "lowlight enhances image quality using a convolutional model that understands how to enrich low-light images"
);
workload!(
    /// Image classification with MobileNet v2
    MobileNet, "mobilenet", "movies", JPG,
    "uses the MobileNet v2 model to classify objects in scenes from movie stills"
);
workload!(
    /// Image classification with MobileViT
    MobileViT, "mobilevit", "movies", JPG,
    "uses the MobileViT model to identify objects in scenes from movie stills"
);
workload!(
    /// Caption-then-moderate pipeline
    Moondream, "moondream", "nsfw", JPG,
    "performs content moderation by captioning an image and then using the offensive speech model to moderate the caption"
);
workload!(
    /// Safe-for-work image classification
    Nsfw, "nsfw", "nsfw", JPG,
    "uses a fine-tuned model to classify images as safe or not safe for work (nsfw)"
);
workload!(
    /// Offensive speech detection
    Offensive, "offensive", "aegis", InstanceFormat::JsonLines,
    "applies the offensive speech detection model to the aegis content safety dataset"
);
workload!(
    /// Named entity recognition
    Gliner, "gliner", "essays", InstanceFormat::JsonLines,
    "applies the GLiNER model to identify and classify named entities in long-form essays"
);

struct Caches {
    data: CacheDir,
    models: CacheDir,
}

/// Benchmark of workload `W` on the cached model and dataset
pub struct ModelBenchmark<W> {
    options: BenchmarkOptions,
    caches: Option<Caches>,
    engine: Option<Box<dyn InferenceEngine>>,
    _workload: PhantomData<W>,
}

impl<W: ModelWorkload> ModelBenchmark<W> {
    fn dataset(&self) -> String {
        W::DATASET.variant(self.options.use_sample)
    }

    fn caches(&mut self) -> Result<&Caches, BenchmarkError> {
        if self.caches.is_none() {
            self.caches = Some(Caches {
                data: self.options.data_cache()?,
                models: self.options.model_cache()?,
            });
        }
        self.caches
            .as_ref()
            .ok_or_else(|| BenchmarkError::Benchmark("cache homes unavailable".into()))
    }

    fn engine(&mut self) -> Result<&mut Box<dyn InferenceEngine>, BenchmarkError> {
        self.engine.as_mut().ok_or_else(|| {
            BenchmarkError::Benchmark(format!("{} benchmark used before setup", W::MODEL))
        })
    }
}

impl<W: ModelWorkload> Benchmark for ModelBenchmark<W> {
    type Instance = DatasetInstance;
    type Features = Features;
    type Output = Vec<f32>;

    const DESCRIPTION: &'static str = W::DESCRIPTION;

    fn new(options: &BenchmarkOptions) -> Result<Self, BenchmarkError> {
        Ok(Self {
            options: options.clone(),
            caches: None,
            engine: None,
            _workload: PhantomData,
        })
    }

    fn total(options: &BenchmarkOptions) -> Result<u64, BenchmarkError> {
        let name = W::DATASET.variant(options.use_sample);
        if let Some(manifest) = options.datasets.as_ref().filter(|m| m.contains(&name)) {
            if let Some(instances) = manifest.instance_count(&name)? {
                return Ok(instances);
            }
        }
        Ok(count_instances(&options.data_cache()?, &W::DATASET, options.use_sample)?)
    }

    fn setup(&mut self) -> Result<(), BenchmarkError> {
        let dataset = self.dataset();
        let models_manifest = self.options.models.clone();
        let datasets_manifest = self.options.datasets.clone();
        let caches = self.caches()?;

        if let Some(manifest) = models_manifest.as_deref() {
            verify_archive(&caches.models, W::MODEL, manifest)?;
        }
        let model_path = find_model_path(&caches.models, W::MODEL, None)?;

        if let Some(manifest) = datasets_manifest.as_deref() {
            verify_archive(&caches.data, &dataset, manifest)?;
        }
        caches.data.find(&dataset, None)?;

        let entry = find_engine(W::MODEL).ok_or_else(|| {
            BenchmarkError::Models(format!("no inference engine is linked for model {}", W::MODEL))
        })?;

        debug!(model = W::MODEL, path = %model_path.display(), "loading inference engine");
        self.engine = Some((entry.load)(&model_path)?);
        Ok(())
    }

    fn teardown(&mut self, evict_cache: bool) -> Result<(), BenchmarkError> {
        self.engine = None;
        if !evict_cache {
            return Ok(());
        }

        let use_sample = self.options.use_sample;
        let caches = self.caches()?;
        let models = cleanup_model(&caches.models, W::MODEL)?;
        let datasets = cleanup_dataset(&caches.data, W::DATASET.name, use_sample)?;
        info!(model = W::MODEL, removed = models + datasets, "evicted cached artifacts");
        Ok(())
    }

    fn instances(&self, limit: Option<i64>) -> Result<InstanceIter<DatasetInstance>, BenchmarkError> {
        let caches = self.caches.as_ref().ok_or_else(|| {
            BenchmarkError::Benchmark(format!("{} benchmark used before setup", W::MODEL))
        })?;
        let instances = load_dataset(&caches.data, &W::DATASET, self.options.use_sample)?;
        Ok(Box::new(
            limit_instances(instances, limit).map(|instance| instance.map_err(BenchmarkError::from)),
        ))
    }

    fn preprocess(&mut self, instance: DatasetInstance) -> Result<Features, BenchmarkError> {
        self.engine()?.preprocess(&instance)
    }

    fn infer(&mut self, features: Features) -> Result<Vec<f32>, BenchmarkError> {
        self.engine()?.infer(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineEntry;
    use inferbench_core::RunnableBenchmark;
    use serde_json::Value;
    use std::fs;
    use std::path::Path;

    /// Token-length engine linked for the offensive speech model in tests
    struct TokenLength;

    impl InferenceEngine for TokenLength {
        fn preprocess(&mut self, instance: &DatasetInstance) -> Result<Features, BenchmarkError> {
            let text = match instance {
                DatasetInstance::Record(record) => record
                    .get("prompt")
                    .and_then(Value::as_str)
                    .ok_or_else(|| BenchmarkError::Inference("record has no prompt".into()))?
                    .to_string(),
                DatasetInstance::File(path) => path.display().to_string(),
            };
            let lengths: Vec<f32> = text.split_whitespace().map(|w| w.len() as f32).collect();
            Features::new(vec![lengths.len()], lengths)
        }

        fn infer(&mut self, features: Features) -> Result<Vec<f32>, BenchmarkError> {
            Ok(vec![features.data.iter().sum()])
        }
    }

    fn load_token_length(_path: &Path) -> Result<Box<dyn InferenceEngine>, BenchmarkError> {
        Ok(Box::new(TokenLength))
    }

    inventory::submit! {
        EngineEntry { model: "offensive", load: load_token_length }
    }

    fn homes() -> (tempfile::TempDir, BenchmarkOptions) {
        let dir = tempfile::tempdir().unwrap();
        let options = BenchmarkOptions {
            data_home: Some(dir.path().join("data")),
            model_home: Some(dir.path().join("models")),
            ..BenchmarkOptions::default()
        };
        (dir, options)
    }

    fn seed_aegis(options: &BenchmarkOptions) {
        let data = options.data_home.as_ref().unwrap().join("aegis-sample");
        fs::create_dir_all(&data).unwrap();
        fs::write(
            data.join("part-0.jsonl"),
            "{\"prompt\": \"how do I bake bread\"}\nnot json\n{\"prompt\": \"hello there\"}\n{\"prompt\": \"one more\"}\n",
        )
        .unwrap();

        let model = options.model_home.as_ref().unwrap().join("offensive");
        fs::create_dir_all(&model).unwrap();
    }

    #[test]
    fn test_descriptions() {
        assert!(ModelBenchmark::<Whisper>::DESCRIPTION.contains("UK dialects"));
        assert_eq!(Gliner::DATASET.format, InstanceFormat::JsonLines);
        assert_eq!(MobileViT::DATASET.name, MobileNet::DATASET.name);
    }

    #[test]
    fn test_missing_model_is_run_scoped() {
        let (_dir, options) = homes();
        let mut bench = ModelBenchmark::<Whisper>::new(&options).unwrap();

        let err = Benchmark::setup(&mut bench).unwrap_err();
        assert!(err.is_run_scoped());
        assert!(err.to_string().contains("does it need to be downloaded?"));
    }

    #[test]
    fn test_unlinked_engine_is_models_error() {
        let (_dir, options) = homes();
        let essays = options.data_home.as_ref().unwrap().join("essays-sample");
        fs::create_dir_all(&essays).unwrap();
        fs::create_dir_all(options.model_home.as_ref().unwrap().join("gliner")).unwrap();

        let mut bench = ModelBenchmark::<Gliner>::new(&options).unwrap();
        let err = Benchmark::setup(&mut bench).unwrap_err();

        assert!(matches!(err, BenchmarkError::Models(_)));
        assert!(err.is_run_scoped());
    }

    #[test]
    fn test_total_counts_local_records() {
        let (_dir, options) = homes();
        seed_aegis(&options);
        assert_eq!(ModelBenchmark::<Offensive>::total(&options).unwrap(), 3);
    }

    #[test]
    fn test_total_prefers_manifest() {
        let (_dir, mut options) = homes();
        let data = options.data_home.clone().unwrap();
        fs::create_dir_all(&data).unwrap();
        fs::write(
            data.join("manifest.json"),
            r#"{"movies-sample": {"url": "u", "signature": "s", "instances": 250}}"#,
        )
        .unwrap();
        options.load_manifests().unwrap();

        assert_eq!(ModelBenchmark::<MobileViT>::total(&options).unwrap(), 250);
    }

    #[test]
    fn test_timed_run_and_eviction() {
        let (_dir, options) = homes();
        seed_aegis(&options);

        let mut bench = ModelBenchmark::<Offensive>::new(&options).unwrap();
        RunnableBenchmark::setup(&mut bench).unwrap();
        let timings = bench.run_timed(Some(2), &mut || {}).unwrap();
        assert_eq!(timings.len(), 2);

        RunnableBenchmark::teardown(&mut bench, true).unwrap();
        assert!(!options.data_home.as_ref().unwrap().join("aegis-sample").exists());
        assert!(!options.model_home.as_ref().unwrap().join("offensive").exists());
    }
}
