//! Benchmark Execution
//!
//! For each benchmark and each run: construct, `setup`, time every instance's
//! preprocess and inference steps, then `teardown`. Teardown runs whatever
//! happened before it and evicts caches only on the last run when cleanup
//! is requested.
//!
//! ## Failure Accounting
//!
//! ```text
//! run-scoped error (datasets, models, inference, benchmark, io)
//!        │
//!        ▼
//!   failures += 1, errors.push(message), next run
//!
//! any other error (configuration, device)
//!        │
//!        ▼
//!   abort the batch
//! ```

use super::RunnerConfig;
use indicatif::{ProgressBar, ProgressStyle};
use inferbench_core::{BenchmarkEntry, BenchmarkError, PhaseTimings};
use inferbench_report::Results;
use inferbench_stats::{Measurement, MetricIdentity, SECONDS, format_duration, merge};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sub-label of preprocessing measurements
pub const PREPROCESSING: &str = "preprocessing";

/// Sub-label of inference measurements
pub const INFERENCING: &str = "inferencing";

/// Run every benchmark and return the completed results
pub(super) fn execute(
    benchmarks: &[BenchmarkEntry],
    config: &RunnerConfig,
) -> Result<Results, BenchmarkError> {
    let start = Instant::now();

    let names = benchmarks.iter().map(|b| b.name.to_string()).collect();
    let mut results = Results::new(config.runs, names);
    results.limit = config.limit;
    results.env = config.env.clone();
    results.device = config.device.clone();
    results.options = config.echo()?;

    let mut collected = Vec::with_capacity(benchmarks.len() * config.runs as usize * 2);
    for benchmark in benchmarks {
        run_benchmark(benchmark, config, &mut results, &mut collected)?;
    }

    let duration = start.elapsed().as_secs_f64();
    results.complete(duration, merge(&collected));

    if config.verbose {
        let cleanup = if config.cleanup {
            " (cached models and datasets removed)"
        } else {
            ""
        };
        let summary = format!(
            "{} benchmark(s) complete in {}{}",
            benchmarks.len(),
            format_duration(duration),
            cleanup
        );
        println!("{}", summary);
        info!(successes = results.successes, failures = results.failures, "{}", summary);
    }

    Ok(results)
}

/// All runs of one benchmark
fn run_benchmark(
    benchmark: &BenchmarkEntry,
    config: &RunnerConfig,
    results: &mut Results,
    collected: &mut Vec<Measurement>,
) -> Result<(), BenchmarkError> {
    let total = match config.limit {
        Some(limit) => limit.max(0) as u64,
        None => match benchmark.total(&config.options) {
            Ok(total) => total,
            Err(e) if e.is_run_scoped() => {
                warn!(benchmark = benchmark.name, error = %e, "cannot size benchmark, skipping its runs");
                for _ in 0..config.runs {
                    results.record_failure(e.to_string());
                }
                return Ok(());
            }
            Err(e) => return Err(e),
        },
    };

    let visible = config.verbose || config.options.progress;

    for run in 0..config.runs {
        let evict_cache = config.cleanup && run + 1 == config.runs;
        debug!(benchmark = benchmark.name, run = run + 1, evict_cache, "starting run");

        let pb = progress_bar(visible, total);
        pb.set_message(format!("{} ({}/{})", benchmark.name, run + 1, config.runs));

        let outcome = run_once(benchmark, config, evict_cache, &pb);
        pb.finish_and_clear();

        match outcome {
            Ok(timings) => {
                results.record_success();
                collected.push(phase_measurement(benchmark, config, PREPROCESSING, timings.preprocessing));
                collected.push(phase_measurement(benchmark, config, INFERENCING, timings.inferencing));
            }
            Err(e) if e.is_run_scoped() => {
                warn!(benchmark = benchmark.name, run = run + 1, kind = e.kind(), error = %e, "run failed");
                results.record_failure(e.to_string());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// One lifecycle pass; teardown always runs once the benchmark exists
fn run_once(
    benchmark: &BenchmarkEntry,
    config: &RunnerConfig,
    evict_cache: bool,
    pb: &ProgressBar,
) -> Result<PhaseTimings, BenchmarkError> {
    let mut instance = benchmark.create(&config.options)?;

    let outcome = instance
        .setup()
        .and_then(|()| instance.run_timed(config.limit, &mut || pb.inc(1)));
    let released = instance.teardown(evict_cache);

    match (outcome, released) {
        (Ok(timings), Ok(())) => Ok(timings),
        (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
        (Err(e), Err(teardown)) => {
            warn!(benchmark = benchmark.name, error = %teardown, "teardown failed after run error");
            Err(e)
        }
    }
}

fn phase_measurement(
    benchmark: &BenchmarkEntry,
    config: &RunnerConfig,
    phase: &str,
    samples: Vec<f64>,
) -> Measurement {
    let metric = MetricIdentity::labeled(benchmark.name)
        .with_sub_label(phase)
        .with_description(benchmark.description)
        .with_device(config.device.clone())
        .with_env(config.env.clone());
    Measurement::new(metric, samples).with_units(SECONDS)
}

fn progress_bar(visible: bool, len: u64) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
