//! Inverted dropout.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::LayerError;
use crate::tensor::Tensor;

/// Inverted dropout over tensor elements.
///
/// During training each element is kept with probability `1 - rate` and
/// rescaled by `1 / (1 - rate)` so that the expected activation is
/// unchanged. At inference (or with rate zero) the input passes through
/// untouched.
///
/// # Example
///
/// ```
/// use afm_layers::dropout::Dropout;
/// use afm_layers::tensor::Tensor;
///
/// let dropout = Dropout::new(0.5).unwrap();
/// let input = Tensor::ones(&[4, 8]);
/// let inference = dropout.apply(&input, false);
/// assert_eq!(inference.data(), input.data());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dropout {
    rate: f32,
}

impl Dropout {
    /// Creates a dropout with the given drop probability.
    ///
    /// # Errors
    ///
    /// Returns a configuration error unless `rate` is in `[0, 1)`.
    pub fn new(rate: f32) -> Result<Self, LayerError> {
        if !(0.0..1.0).contains(&rate) {
            return Err(LayerError::ConfigError {
                message: format!("Dropout rate must be in [0, 1), got {}", rate),
            });
        }
        Ok(Self { rate })
    }

    /// Returns the drop probability.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Applies dropout to the input.
    ///
    /// A no-op when `training` is false or the rate is zero.
    pub fn apply(&self, input: &Tensor, training: bool) -> Tensor {
        if !training || self.rate == 0.0 {
            return input.clone();
        }

        let keep_prob = 1.0 - self.rate;
        let mut rng = rand::thread_rng();
        let data: Vec<f32> = input
            .data()
            .iter()
            .map(|&x| {
                if rng.gen::<f32>() < keep_prob {
                    x / keep_prob
                } else {
                    0.0
                }
            })
            .collect();
        Tensor::from_data(input.shape(), data)
    }
}
