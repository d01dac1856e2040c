//! Batched Dot Product
//!
//! CPU micro benchmarks computing the row-wise dot product of a `k0 x k1`
//! matrix with itself, either by multiplying element-wise and summing each
//! row, or by reshaping into a batch of `1 x k1` by `k1 x 1` matrix products.
//!
//! Instances are matrix shapes. The full grid is every pair drawn from
//! `{16, 64, 1024, 16384}`, the sample grid every pair drawn from
//! `{16, 64, 256}`. With the `fuzz` option ten shapes are drawn log-uniformly
//! from `[1, 10000]` per side (`seed` makes the draw reproducible).

use inferbench_core::{Benchmark, BenchmarkError, BenchmarkOptions, InstanceIter, limit_instances};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::marker::PhantomData;

/// Side lengths of the full grid
pub const FULL_SIZES: [usize; 4] = [16, 64, 1024, 16384];

/// Side lengths of the sample grid
pub const SAMPLE_SIZES: [usize; 3] = [16, 64, 256];

/// Number of fuzzed shapes per run
pub const FUZZ_INSTANCES: usize = 10;

const FUZZ_MIN_SIDE: f64 = 1.0;
const FUZZ_MAX_SIDE: f64 = 10_000.0;
const FUZZ_MIN_ELEMENTS: usize = 128;
const FUZZ_MAX_ELEMENTS: usize = 10_000_000;

/// Matrix dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    /// Rows (batch size)
    pub k0: usize,
    /// Columns (vector length)
    pub k1: usize,
}

impl Shape {
    /// Number of elements
    pub fn elements(&self) -> usize {
        self.k0 * self.k1
    }
}

/// Dense row-major `f32` matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    shape: Shape,
    data: Vec<f32>,
}

impl Matrix {
    /// Matrix of ones
    pub fn ones(shape: Shape) -> Self {
        Self {
            shape,
            data: vec![1.0; shape.elements()],
        }
    }

    /// Dimensions
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Row-major elements
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// A way of computing the batched dot product
pub trait DotKernel: 'static {
    /// Description of the benchmark using this kernel
    const DESCRIPTION: &'static str;

    /// Row-wise dot products of `a` and `b`
    fn batched_dot(a: &Matrix, b: &Matrix) -> Vec<f32>;
}

/// Element-wise multiply, then sum the last axis
#[derive(Debug)]
pub struct MulSum;

impl DotKernel for MulSum {
    const DESCRIPTION: &'static str =
        "computes the batched dot product of ones-matrices by multiplying and summing rows";

    fn batched_dot(a: &Matrix, b: &Matrix) -> Vec<f32> {
        let k1 = a.shape.k1.max(1);
        a.data
            .chunks(k1)
            .zip(b.data.chunks(k1))
            .map(|(x, y)| x.iter().zip(y).map(|(x, y)| x * y).sum())
            .collect()
    }
}

/// Reshape to `(k0, 1, k1) x (k0, k1, 1)` and run a batched matrix product
#[derive(Debug)]
pub struct Bmm;

impl DotKernel for Bmm {
    const DESCRIPTION: &'static str =
        "computes the batched dot product of ones-matrices by reducing it to a batched matrix product";

    fn batched_dot(a: &Matrix, b: &Matrix) -> Vec<f32> {
        let Shape { k0, k1 } = a.shape;
        bmm(&a.data, &b.data, k0, 1, k1, 1)
    }
}

/// Batched matrix product of `(batch, m, k)` and `(batch, k, n)` operands
fn bmm(a: &[f32], b: &[f32], batch: usize, m: usize, k: usize, n: usize) -> Vec<f32> {
    let mut out = vec![0.0; batch * m * n];

    for p in 0..batch {
        let lhs = &a[p * m * k..(p + 1) * m * k];
        let rhs = &b[p * k * n..(p + 1) * k * n];
        let dst = &mut out[p * m * n..(p + 1) * m * n];

        for i in 0..m {
            for l in 0..k {
                let scale = lhs[i * k + l];
                for j in 0..n {
                    dst[i * n + j] += scale * rhs[l * n + j];
                }
            }
        }
    }

    out
}

/// Batched dot benchmark over a shape grid, generic over the kernel
#[derive(Debug)]
pub struct BatchedDot<K> {
    shapes: Vec<Shape>,
    _kernel: PhantomData<K>,
}

/// Multiply-and-sum variant
pub type BatchedDotMulSum = BatchedDot<MulSum>;

/// Batched matrix product variant
pub type BatchedDotBmm = BatchedDot<Bmm>;

impl<K> BatchedDot<K> {
    /// Shapes this benchmark iterates over
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }
}

impl<K: DotKernel> Benchmark for BatchedDot<K> {
    type Instance = Shape;
    type Features = Matrix;
    type Output = Vec<f32>;

    const DESCRIPTION: &'static str = K::DESCRIPTION;

    fn new(options: &BenchmarkOptions) -> Result<Self, BenchmarkError> {
        let shapes = if options.flag("fuzz") {
            fuzzed_shapes(options.integer("seed"), FUZZ_INSTANCES)
        } else {
            static_grid(options.use_sample)
        };

        Ok(Self {
            shapes,
            _kernel: PhantomData,
        })
    }

    fn total(options: &BenchmarkOptions) -> Result<u64, BenchmarkError> {
        let count = if options.flag("fuzz") {
            FUZZ_INSTANCES
        } else if options.use_sample {
            SAMPLE_SIZES.len().pow(2)
        } else {
            FULL_SIZES.len().pow(2)
        };
        Ok(count as u64)
    }

    fn setup(&mut self) -> Result<(), BenchmarkError> {
        Ok(())
    }

    fn teardown(&mut self, _evict_cache: bool) -> Result<(), BenchmarkError> {
        Ok(())
    }

    fn instances(&self, limit: Option<i64>) -> Result<InstanceIter<Shape>, BenchmarkError> {
        let shapes = self.shapes.clone();
        Ok(Box::new(limit_instances(shapes.into_iter(), limit).map(Ok)))
    }

    fn preprocess(&mut self, shape: Shape) -> Result<Matrix, BenchmarkError> {
        Ok(Matrix::ones(shape))
    }

    fn infer(&mut self, x: Matrix) -> Result<Vec<f32>, BenchmarkError> {
        Ok(K::batched_dot(&x, &x))
    }
}

/// Every `(k0, k1)` pair from the full or sample sizes
pub fn static_grid(use_sample: bool) -> Vec<Shape> {
    let sizes: &[usize] = if use_sample { &SAMPLE_SIZES } else { &FULL_SIZES };
    sizes
        .iter()
        .flat_map(|&k0| sizes.iter().map(move |&k1| Shape { k0, k1 }))
        .collect()
}

/// Log-uniform shapes with an element count between 128 and 10^7
pub fn fuzzed_shapes(seed: Option<u64>, count: usize) -> Vec<Shape> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut shapes = Vec::with_capacity(count);
    while shapes.len() < count {
        let shape = Shape {
            k0: log_uniform(&mut rng),
            k1: log_uniform(&mut rng),
        };
        if (FUZZ_MIN_ELEMENTS..=FUZZ_MAX_ELEMENTS).contains(&shape.elements()) {
            shapes.push(shape);
        }
    }
    shapes
}

fn log_uniform(rng: &mut StdRng) -> usize {
    let exponent = rng.gen_range(FUZZ_MIN_SIDE.ln()..=FUZZ_MAX_SIDE.ln());
    exponent.exp().round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use inferbench_core::RunnableBenchmark;

    #[test]
    fn test_grids() {
        let sample = static_grid(true);
        assert_eq!(sample.len(), 9);
        assert_eq!(sample[0], Shape { k0: 16, k1: 16 });
        assert_eq!(sample[8], Shape { k0: 256, k1: 256 });

        let full = static_grid(false);
        assert_eq!(full.len(), 16);
        assert_eq!(full[15], Shape { k0: 16384, k1: 16384 });
    }

    #[test]
    fn test_kernels_agree() {
        let x = Matrix::ones(Shape { k0: 16, k1: 64 });

        let mul_sum = MulSum::batched_dot(&x, &x);
        let via_bmm = Bmm::batched_dot(&x, &x);

        assert_eq!(mul_sum.len(), 16);
        assert_eq!(mul_sum, via_bmm);
        assert!(mul_sum.iter().all(|v| *v == 64.0));
    }

    #[test]
    fn test_bmm_general_shapes() {
        // two batches of (1x2) @ (2x2)
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [1.0, 0.0, 0.0, 1.0, 2.0, 0.0, 0.0, 2.0];
        assert_eq!(bmm(&a, &b, 2, 1, 2, 2), vec![1.0, 2.0, 6.0, 8.0]);
    }

    #[test]
    fn test_fuzz_is_seeded_and_bounded() {
        let first = fuzzed_shapes(Some(42), FUZZ_INSTANCES);
        let second = fuzzed_shapes(Some(42), FUZZ_INSTANCES);

        assert_eq!(first, second);
        assert_eq!(first.len(), FUZZ_INSTANCES);
        for shape in &first {
            assert!((1..=10_000).contains(&shape.k0));
            assert!((FUZZ_MIN_ELEMENTS..=FUZZ_MAX_ELEMENTS).contains(&shape.elements()));
        }
    }

    #[test]
    fn test_total_tracks_options() {
        let mut options = BenchmarkOptions::default();
        assert_eq!(BatchedDotMulSum::total(&options).unwrap(), 9);

        options.use_sample = false;
        assert_eq!(BatchedDotBmm::total(&options).unwrap(), 16);

        options.extra.insert("fuzz".into(), true.into());
        assert_eq!(BatchedDotBmm::total(&options).unwrap(), FUZZ_INSTANCES as u64);
    }

    #[test]
    fn test_timed_run_respects_limit() {
        let mut bench = BatchedDotMulSum::new(&BenchmarkOptions::default()).unwrap();
        let timings = RunnableBenchmark::run_timed(&mut bench, Some(3), &mut || {}).unwrap();

        assert_eq!(timings.len(), 3);
        assert_eq!(timings.inferencing.len(), 3);
    }
}
