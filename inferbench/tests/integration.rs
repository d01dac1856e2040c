//! Integration tests for inferbench
//!
//! These tests drive the built-in plugins through the runner end to end,
//! using throwaway cache homes.

use inferbench::{
    Benchmark, BenchmarkEntry, BenchmarkError, BenchmarkOptions, BenchmarkRunner,
    DatasetInstance, EngineEntry, Features, InferenceEngine, InstanceIter, Measurement, MetricIdentity, Results, RunnerConfig, RunnerState, build_plan,
    dumps, format_human_output, limit_instances, load_results, loads, registered,
    resolve_exclude,
};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Essay word-count engine linked for the gliner model
struct WordCount;

impl InferenceEngine for WordCount {
    fn preprocess(&mut self, instance: &DatasetInstance) -> Result<Features, BenchmarkError> {
        let DatasetInstance::Record(record) = instance else {
            return Err(BenchmarkError::Inference("expected a record".into()));
        };
        let text = record.get("text").and_then(Value::as_str).unwrap_or_default();
        let words = text.split_whitespace().count();
        Features::new(vec![1], vec![words as f32])
    }

    fn infer(&mut self, features: Features) -> Result<Vec<f32>, BenchmarkError> {
        Ok(features.data.iter().map(|w| w * 2.0).collect())
    }
}

fn load_word_count(_path: &Path) -> Result<Box<dyn InferenceEngine>, BenchmarkError> {
    Ok(Box::new(WordCount))
}

inferbench::internal::inventory::submit! {
    EngineEntry { model: "gliner", load: load_word_count }
}

/// Benchmark whose dataset cannot be opened
struct Unreachable;

impl Benchmark for Unreachable {
    type Instance = u64;
    type Features = u64;
    type Output = u64;

    const DESCRIPTION: &'static str = "dataset cannot be opened";

    fn new(_options: &BenchmarkOptions) -> Result<Self, BenchmarkError> {
        Ok(Self)
    }

    fn total(_options: &BenchmarkOptions) -> Result<u64, BenchmarkError> {
        Ok(4)
    }

    fn setup(&mut self) -> Result<(), BenchmarkError> {
        Ok(())
    }

    fn teardown(&mut self, _evict_cache: bool) -> Result<(), BenchmarkError> {
        Ok(())
    }

    fn instances(&self, _limit: Option<i64>) -> Result<InstanceIter<u64>, BenchmarkError> {
        Err(BenchmarkError::Datasets("shard index is unreadable".into()))
    }

    fn preprocess(&mut self, instance: u64) -> Result<u64, BenchmarkError> {
        Ok(instance)
    }

    fn infer(&mut self, features: u64) -> Result<u64, BenchmarkError> {
        Ok(features)
    }
}

/// Benchmark whose dataset breaks after the first instance
struct Truncated;

impl Benchmark for Truncated {
    type Instance = u64;
    type Features = u64;
    type Output = u64;

    const DESCRIPTION: &'static str = "dataset ends in a corrupt record";

    fn new(_options: &BenchmarkOptions) -> Result<Self, BenchmarkError> {
        Ok(Self)
    }

    fn total(_options: &BenchmarkOptions) -> Result<u64, BenchmarkError> {
        Ok(4)
    }

    fn setup(&mut self) -> Result<(), BenchmarkError> {
        Ok(())
    }

    fn teardown(&mut self, _evict_cache: bool) -> Result<(), BenchmarkError> {
        Ok(())
    }

    fn instances(&self, _limit: Option<i64>) -> Result<InstanceIter<u64>, BenchmarkError> {
        let records = vec![
            Ok(1),
            Err(BenchmarkError::Datasets("corrupt record at line 2".into())),
            Ok(3),
        ];
        Ok(Box::new(records.into_iter()))
    }

    fn preprocess(&mut self, instance: u64) -> Result<u64, BenchmarkError> {
        Ok(instance)
    }

    fn infer(&mut self, features: u64) -> Result<u64, BenchmarkError> {
        Ok(features)
    }
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

fn plan(names: &[&str]) -> Vec<inferbench::BenchmarkEntry> {
    let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    build_plan(registered().into_iter().copied(), &names, &[], &[])
        .unwrap()
        .benchmarks
}

fn seed_essays(options: &BenchmarkOptions) {
    let essays = options.data_home.as_ref().unwrap().join("essays-sample");
    fs::create_dir_all(&essays).unwrap();
    fs::write(
        essays.join("part-0.jsonl"),
        "{\"text\": \"the quick brown fox\"}\n{\"text\": \"jumps over\"}\n{\"text\": \"the lazy dog\"}\n{\"text\": \"again\"}\n",
    )
    .unwrap();
    fs::create_dir_all(options.model_home.as_ref().unwrap().join("gliner")).unwrap();
}

/// A missing dataset fails its runs without stopping the other benchmark
#[test]
fn test_partial_failure_across_plugins() {
    let (_dir, options) = homes();
    let config = RunnerConfig {
        runs: 2,
        limit: Some(3),
        device: Some("cpu".into()),
        options,
        ..RunnerConfig::default()
    };

    let mut runner = BenchmarkRunner::new(plan(&["dot-bmm", "whisper"]), config).unwrap();
    let results = runner.run().unwrap();

    assert!(results.is_complete());
    assert_eq!(results.benchmarks, vec!["dot-bmm", "whisper"]);
    assert_eq!(results.successes, 2);
    assert_eq!(results.failures, 2);
    assert_eq!(results.errors.len(), 2);
    assert!(results.errors[0].contains("does it need to be downloaded?"));

    let measurements = results.measurements.as_ref().unwrap();
    assert_eq!(measurements.len(), 2);
    assert!(measurements.iter().all(|m| m.label() == Some("dot-bmm")));
    assert!(measurements.iter().all(|m| m.len() == 6));
    assert!(measurements.iter().all(|m| m.device() == Some("cpu")));
}

/// Dataset errors raised while iterating fail only their own runs
#[test]
fn test_failing_instances_do_not_stop_other_plugins() {
    let (dir, options) = homes();
    let config = RunnerConfig {
        runs: 2,
        limit: Some(3),
        options,
        ..RunnerConfig::default()
    };

    let benchmarks = plan(&["dot-bmm"])
        .into_iter()
        .chain([
            BenchmarkEntry::of::<Unreachable>("unreachable"),
            BenchmarkEntry::of::<Truncated>("truncated"),
        ])
        .collect();
    let mut runner = BenchmarkRunner::new(benchmarks, config).unwrap();
    let results = runner.run().unwrap();

    assert!(results.is_complete());
    assert_eq!(results.benchmarks, vec!["dot-bmm", "unreachable", "truncated"]);
    assert_eq!(results.successes, 2);
    assert_eq!(results.failures, 4);
    assert_eq!(
        results.errors,
        vec![
            "shard index is unreadable",
            "shard index is unreadable",
            "corrupt record at line 2",
            "corrupt record at line 2",
        ]
    );

    let measurements = results.measurements.as_ref().unwrap();
    assert_eq!(measurements.len(), 2);
    assert!(measurements.iter().all(|m| m.label() == Some("dot-bmm")));
    assert!(measurements.iter().all(|m| m.len() == 6));

    let path = dir.path().join("results.json");
    assert!(runner.save(&path).is_ok());
    assert_eq!(&load_results(&path).unwrap(), runner.results().unwrap());
}

/// Datasets and models are evicted only after the last run
#[test]
fn test_model_benchmark_evicts_after_last_run() {
    let (_dir, options) = homes();
    seed_essays(&options);
    let data_home = options.data_home.clone().unwrap();
    let model_home = options.model_home.clone().unwrap();

    let config = RunnerConfig {
        runs: 3,
        options,
        ..RunnerConfig::default()
    };
    let mut runner = BenchmarkRunner::new(plan(&["gliner"]), config).unwrap();
    let results = runner.run().unwrap();

    assert_eq!(results.successes, 3, "errors: {:?}", results.errors);
    let measurements = results.measurements.as_ref().unwrap();
    assert_eq!(measurements.len(), 2);
    assert_eq!(measurements[0].len(), 12);

    assert!(!data_home.join("essays-sample").exists());
    assert!(!model_home.join("gliner").exists());
}

#[test]
fn test_model_benchmark_keeps_cache_without_cleanup() {
    let (_dir, options) = homes();
    seed_essays(&options);
    let data_home = options.data_home.clone().unwrap();

    let config = RunnerConfig {
        runs: 2,
        cleanup: false,
        options,
        ..RunnerConfig::default()
    };
    let mut runner = BenchmarkRunner::new(plan(&["gliner"]), config).unwrap();
    runner.run().unwrap();

    assert!(data_home.join("essays-sample").exists());
}

/// Saved results load back equal, tags included
#[test]
fn test_results_round_trip() {
    let (dir, options) = homes();
    let config = RunnerConfig {
        limit: Some(2),
        env: Some("ci".into()),
        options,
        ..RunnerConfig::default()
    };
    let mut runner = BenchmarkRunner::new(plan(&["dot-mulsum"]), config).unwrap();
    runner.run().unwrap();

    let path = dir.path().join("out").join("results.json");
    runner.save(&path).unwrap();

    let loaded = load_results(&path).unwrap();
    assert_eq!(&loaded, runner.results().unwrap());

    let document: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document["type"], "Results");
    assert_eq!(document["measurements"][0]["type"], "Measurement");
    assert_eq!(document["measurements"][0]["metric"]["type"], "MetricIdentity");
    assert_eq!(document["measurements"][0]["metric"]["env"], "ci");
    assert_eq!(document["options"]["cleanup"], true);

    let again: Results = loads(&dumps(&loaded).unwrap()).unwrap();
    assert_eq!(again, loaded);
}

#[test]
fn test_save_before_run_fails() {
    let runner = BenchmarkRunner::new(plan(&["dot-bmm"]), RunnerConfig::default()).unwrap();
    assert_eq!(runner.state(), RunnerState::Idle);

    let dir = tempfile::tempdir().unwrap();
    assert!(runner.save(dir.path().join("results.json")).is_err());
}

#[test]
fn test_zero_runs_yield_empty_measurements() {
    let config = RunnerConfig {
        runs: 0,
        ..RunnerConfig::default()
    };
    let mut runner = BenchmarkRunner::new(plan(&["dot-bmm"]), config).unwrap();
    let results = runner.run().unwrap();

    assert_eq!(results.successes, 0);
    assert_eq!(results.failures, 0);
    assert_eq!(results.measurements.as_deref(), Some(&[][..]));
}

#[test]
fn test_non_positive_limit_runs_no_instances() {
    let config = RunnerConfig {
        limit: Some(-10),
        ..RunnerConfig::default()
    };
    let mut runner = BenchmarkRunner::new(plan(&["dot-mulsum"]), config).unwrap();
    let results = runner.run().unwrap();

    assert_eq!(results.successes, 1);
    let measurements = results.measurements.as_ref().unwrap();
    assert!(measurements.iter().all(Measurement::is_empty));
    assert!(format_human_output(results).contains("(0 samples)"));
}

#[test]
fn test_malformed_manifest_is_configuration_error() {
    let (dir, mut options) = homes();
    let manifest = dir.path().join("broken.json");
    fs::write(&manifest, "{ nope").unwrap();
    options.datasets_manifest = Some(manifest);

    let config = RunnerConfig {
        options,
        ..RunnerConfig::default()
    };
    let err = BenchmarkRunner::new(plan(&["nsfw"]), config).err().unwrap();
    assert!(matches!(err, BenchmarkError::Configuration(_)));
}

/// Type-7 statistics over a fixed sample set
#[test]
fn test_golden_statistics() {
    let samples = vec![
        21.82307791099665,
        26.531772732839926,
        27.505767531015223,
        16.403111227499263,
        28.29817512637112,
        16.76156931690454,
        25.319997297409323,
    ];
    let m = Measurement::new(MetricIdentity::labeled("Basic").with_sub_label("bmm"), samples);

    assert!((m.median() - 25.319997297409323).abs() < 1e-9);
    assert!((m.mean() - 23.23478159186229).abs() < 1e-9);
    assert!((m.p25() - 19.292323613950593).abs() < 1e-9);
    assert!((m.p75() - 27.018770131927575).abs() < 1e-9);
    assert!((m.iqr() - 7.7264465179769815).abs() < 1e-9);
    assert!(m.warnings()[0].contains("30.5%"));
}

#[test]
fn test_limit_semantics() {
    let cases: [(Option<i64>, usize); 7] = [
        (None, 10),
        (Some(10), 10),
        (Some(15), 10),
        (Some(5), 5),
        (Some(1), 1),
        (Some(0), 0),
        (Some(-10), 0),
    ];

    for (limit, expected) in cases {
        assert_eq!(limit_instances(0..10, limit).count(), expected, "limit {:?}", limit);
    }
}

#[test]
fn test_resolve_exclude() {
    let all = ["A", "B", "C", "D", "E"];

    let excluded = resolve_exclude(&["B"], &["A", "B", "C"], &all);
    let excluded: Vec<_> = excluded.into_iter().collect();
    assert_eq!(excluded, vec!["b", "d", "e"]);

    assert!(resolve_exclude::<&str>(&[], &[], &all).is_empty());
}

#[test]
fn test_builtins_registered() {
    let names: Vec<_> = registered().iter().map(|e| e.name).collect();
    for builtin in inferbench::BUILTINS {
        assert!(names.contains(&builtin), "{} not registered", builtin);
    }
}
