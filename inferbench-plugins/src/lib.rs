#![warn(missing_docs)]
//! inferbench Plugins
//!
//! Built-in benchmarks, registered with the core registry at link time:
//! - `dot-mulsum`, `dot-bmm`: batched dot product micro benchmarks
//! - `whisper`, `lowlight`, `mobilenet`, `mobilevit`, `moondream`, `nsfw`,
//!   `offensive`, `gliner`: model benchmarks over cached datasets
//!
//! Model benchmarks need an [`InferenceEngine`] linked for their model name.

mod dot;
mod engine;
mod roster;

pub use dot::{
    BatchedDot, BatchedDotBmm, BatchedDotMulSum, Bmm, DotKernel, FULL_SIZES, FUZZ_INSTANCES,
    Matrix, MulSum, SAMPLE_SIZES, Shape, fuzzed_shapes, static_grid,
};
pub use engine::{EngineEntry, Features, InferenceEngine, find_engine};
pub use roster::{
    Gliner, LowLight, MobileNet, MobileViT, ModelBenchmark, ModelWorkload, Moondream, Nsfw,
    Offensive, Whisper,
};

use inferbench_core::BenchmarkEntry;

/// Names of the built-in benchmarks, sorted
pub static BUILTINS: [&str; 10] = [
    "dot-bmm", "dot-mulsum", "gliner", "lowlight", "mobilenet", "mobilevit", "moondream", "nsfw",
    "offensive", "whisper",
];

inventory::submit! { BenchmarkEntry::of::<BatchedDotMulSum>("dot-mulsum") }
inventory::submit! { BenchmarkEntry::of::<BatchedDotBmm>("dot-bmm") }

inventory::submit! { BenchmarkEntry::of::<ModelBenchmark<Whisper>>("whisper").with_manifest() }
inventory::submit! { BenchmarkEntry::of::<ModelBenchmark<LowLight>>("lowlight").with_manifest() }
inventory::submit! { BenchmarkEntry::of::<ModelBenchmark<MobileNet>>("mobilenet").with_manifest() }
inventory::submit! { BenchmarkEntry::of::<ModelBenchmark<MobileViT>>("mobilevit").with_manifest() }
inventory::submit! { BenchmarkEntry::of::<ModelBenchmark<Moondream>>("moondream").with_manifest() }
inventory::submit! { BenchmarkEntry::of::<ModelBenchmark<Nsfw>>("nsfw").with_manifest() }
inventory::submit! { BenchmarkEntry::of::<ModelBenchmark<Offensive>>("offensive").with_manifest() }
inventory::submit! { BenchmarkEntry::of::<ModelBenchmark<Gliner>>("gliner").with_manifest() }
