//! Regression loss.

use afm_layers::Tensor;

use crate::error::{ModelError, ModelResult};

/// Root-mean-squared-error between predictions and labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmseLoss;

impl RmseLoss {
    /// Creates the loss.
    pub fn new() -> Self {
        Self
    }

    /// Computes `sqrt(mean((prediction - label)^2))`.
    ///
    /// Both inputs must be 1D with the same length. An empty batch yields
    /// zero loss.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch sizes disagree.
    pub fn forward(&self, predictions: &Tensor, labels: &Tensor) -> ModelResult<f32> {
        let n = predictions.numel();
        if n != labels.numel() {
            return Err(ModelError::BatchSizeMismatch {
                predictions: n,
                labels: labels.numel(),
            });
        }
        if n == 0 {
            return Ok(0.0);
        }

        let mse: f32 = predictions
            .data()
            .iter()
            .zip(labels.data())
            .map(|(p, y)| (p - y) * (p - y))
            .sum::<f32>()
            / n as f32;
        Ok(mse.sqrt())
    }
}
