//! Benchmark Planner
//!
//! Builds the execution plan from the registry and the command line
//! selection:
//! - Positional names and `--include` restrict the plan to those benchmarks
//! - `--exclude` removes benchmarks and always wins over inclusion
//!
//! Ordering: Benchmarks are sorted alphabetically by name for deterministic
//! execution. Names match case-insensitively after trimming whitespace.

use inferbench_core::{BenchmarkEntry, BenchmarkError};
use std::collections::BTreeSet;

/// Execution plan for benchmarks
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Ordered list of benchmarks to run
    pub benchmarks: Vec<BenchmarkEntry>,
}

impl ExecutionPlan {
    /// Names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.benchmarks.iter().map(|b| b.name).collect()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Merge exclusions and inclusions into a definitive exclusion set.
///
/// When `include` is non-empty, every item of `all` not included is excluded.
/// An item that is both included and excluded stays excluded.
pub fn resolve_exclude<S: AsRef<str>>(exclude: &[S], include: &[S], all: &[S]) -> BTreeSet<String> {
    let mut excluded: BTreeSet<String> = exclude.iter().map(|s| normalize(s.as_ref())).collect();
    let included: BTreeSet<String> = include.iter().map(|s| normalize(s.as_ref())).collect();

    if !included.is_empty() {
        excluded.extend(
            all.iter()
                .map(|s| normalize(s.as_ref()))
                .filter(|item| !included.contains(item)),
        );
    }

    excluded
}

/// Build execution plan from registered benchmarks.
///
/// Unknown names in any selection list are a configuration error.
pub fn build_plan(
    benchmarks: impl IntoIterator<Item = BenchmarkEntry>,
    names: &[String],
    include: &[String],
    exclude: &[String],
) -> Result<ExecutionPlan, BenchmarkError> {
    let mut available: Vec<BenchmarkEntry> = benchmarks.into_iter().collect();
    available.sort_by_key(|b| b.name);

    let known: Vec<String> = available.iter().map(|b| normalize(b.name)).collect();
    for requested in names.iter().chain(include).chain(exclude) {
        if !known.contains(&normalize(requested)) {
            return Err(BenchmarkError::Configuration(format!(
                "unknown benchmark \"{}\" (available: {})",
                requested.trim(),
                known.join(", ")
            )));
        }
    }

    let include: Vec<&String> = names.iter().chain(include).collect();
    let exclude: Vec<&String> = exclude.iter().collect();
    let known: Vec<&String> = known.iter().collect();
    let excluded = resolve_exclude(&exclude, &include, &known);

    let selected = available
        .into_iter()
        .filter(|b| !excluded.contains(&normalize(b.name)))
        .collect();

    Ok(ExecutionPlan {
        benchmarks: selected,
    })
}
