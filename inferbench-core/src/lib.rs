#![warn(missing_docs)]
//! inferbench Core - Benchmark Runtime
//!
//! This crate defines what a benchmark is and how the runner drives it:
//! - [`Benchmark`] contract and its object-safe [`RunnableBenchmark`] view
//! - [`limit_instances`] for capping lazy instance streams
//! - Monotonic phase [`Timer`]
//! - [`BenchmarkError`] taxonomy and [`Device`] parsing
//! - Link-time plugin registry ([`BenchmarkEntry`])

mod benchmark;
mod device;
mod error;
mod limit;
mod measure;

pub use benchmark::{Benchmark, BenchmarkOptions, InstanceIter, PhaseTimings, RunnableBenchmark};
pub use device::{DEVICE_CHOICES, Device, DeviceError};
pub use error::BenchmarkError;
pub use limit::limit_instances;
pub use measure::Timer;

/// Benchmark plugin registered with `inventory::submit!`
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkEntry {
    /// Unique plugin name, used for selection and as the metric label
    pub name: &'static str,
    /// Human-readable summary
    pub description: &'static str,
    /// Whether construction needs the datasets/models manifests
    pub requires_manifest: bool,
    total_fn: fn(&BenchmarkOptions) -> Result<u64, BenchmarkError>,
    create_fn: fn(&BenchmarkOptions) -> Result<Box<dyn RunnableBenchmark>, BenchmarkError>,
}

impl BenchmarkEntry {
    /// Registry entry for benchmark type `B`
    pub const fn of<B: Benchmark>(name: &'static str) -> Self {
        Self {
            name,
            description: B::DESCRIPTION,
            requires_manifest: false,
            total_fn: B::total,
            create_fn: create_boxed::<B>,
        }
    }

    /// Mark the plugin as reading manifests
    pub const fn with_manifest(mut self) -> Self {
        self.requires_manifest = true;
        self
    }

    /// Full dataset size reported by the plugin
    pub fn total(&self, options: &BenchmarkOptions) -> Result<u64, BenchmarkError> {
        (self.total_fn)(options)
    }

    /// Construct a fresh plugin instance
    pub fn create(&self, options: &BenchmarkOptions) -> Result<Box<dyn RunnableBenchmark>, BenchmarkError> {
        (self.create_fn)(options)
    }
}

fn create_boxed<B: Benchmark>(options: &BenchmarkOptions) -> Result<Box<dyn RunnableBenchmark>, BenchmarkError> {
    Ok(Box::new(B::new(options)?))
}

inventory::collect!(BenchmarkEntry);

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<BenchmarkEntry> {}
};

/// All registered plugins, sorted by name
pub fn registered() -> Vec<&'static BenchmarkEntry> {
    let mut entries: Vec<_> = inventory::iter::<BenchmarkEntry>.into_iter().collect();
    entries.sort_by(|a, b| a.name.cmp(b.name));
    entries
}

/// Look up a plugin by name, ignoring case
pub fn find_benchmark(name: &str) -> Option<&'static BenchmarkEntry> {
    inventory::iter::<BenchmarkEntry>
        .into_iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
}
