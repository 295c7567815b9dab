//! Weight initialization strategies.
//!
//! Initializers are applied through a caller-supplied RNG so that a single
//! seed makes whole-model initialization reproducible.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::tensor::Tensor;

/// Weight initialization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    /// All zeros.
    Zeros,
    /// All ones.
    Ones,
    /// Constant value.
    Constant(f32),
    /// Glorot/Xavier uniform initialization.
    XavierUniform {
        /// Gain factor applied to the sampling limit.
        gain: f32,
    },
    /// Glorot/Xavier normal initialization.
    XavierNormal {
        /// Gain factor applied to the standard deviation.
        gain: f32,
    },
    /// Normal distribution with explicit mean and standard deviation.
    RandomNormal {
        /// Mean of the distribution.
        mean: f32,
        /// Standard deviation of the distribution.
        stddev: f32,
    },
}

impl Default for Initializer {
    fn default() -> Self {
        Initializer::XavierUniform { gain: 1.0 }
    }
}

impl Initializer {
    /// Xavier uniform with the default gain of 1.0.
    pub fn xavier_uniform() -> Self {
        Initializer::XavierUniform { gain: 1.0 }
    }

    /// Xavier normal with the default gain of 1.0.
    pub fn xavier_normal() -> Self {
        Initializer::XavierNormal { gain: 1.0 }
    }

    /// Standard normal (mean 0, stddev 1).
    pub fn standard_normal() -> Self {
        Initializer::RandomNormal {
            mean: 0.0,
            stddev: 1.0,
        }
    }

    /// Creates a tensor of the given shape initialized by this strategy.
    ///
    /// # Example
    ///
    /// ```
    /// use afm_layers::initializer::Initializer;
    /// use rand::rngs::StdRng;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let w = Initializer::xavier_normal().initialize(&[16, 8], &mut rng);
    /// assert_eq!(w.shape(), &[16, 8]);
    /// ```
    pub fn initialize<R: Rng + ?Sized>(&self, shape: &[usize], rng: &mut R) -> Tensor {
        let numel: usize = shape.iter().product();
        match *self {
            Initializer::Zeros => Tensor::zeros(shape),
            Initializer::Ones => Tensor::ones(shape),
            Initializer::Constant(value) => Tensor::from_data(shape, vec![value; numel]),
            Initializer::XavierUniform { gain } => {
                let (fan_in, fan_out) = fan_in_out(shape);
                let limit = gain * (6.0 / (fan_in + fan_out) as f32).sqrt();
                let data: Vec<f32> = (0..numel).map(|_| rng.gen_range(-limit..limit)).collect();
                Tensor::from_data(shape, data)
            }
            Initializer::XavierNormal { gain } => {
                let (fan_in, fan_out) = fan_in_out(shape);
                let stddev = (gain as f64) * (2.0 / (fan_in + fan_out) as f64).sqrt();
                sample_normal(shape, 0.0, stddev, rng)
            }
            Initializer::RandomNormal { mean, stddev } => {
                sample_normal(shape, mean as f64, stddev as f64, rng)
            }
        }
    }
}

fn sample_normal<R: Rng + ?Sized>(shape: &[usize], mean: f64, stddev: f64, rng: &mut R) -> Tensor {
    let numel: usize = shape.iter().product();
    let normal = Normal::new(mean, stddev).expect("stddev must be finite and positive");
    let data: Vec<f32> = (0..numel).map(|_| normal.sample(rng) as f32).collect();
    Tensor::from_data(shape, data)
}

fn fan_in_out(shape: &[usize]) -> (usize, usize) {
    if shape.len() >= 2 {
        (shape[0].max(1), shape[shape.len() - 1].max(1))
    } else if shape.len() == 1 {
        let dim = shape[0].max(1);
        (dim, dim)
    } else {
        (1, 1)
    }
}
