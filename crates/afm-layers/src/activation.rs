//! Activation functions.

use crate::error::LayerError;
use crate::layer::Layer;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Rectified Linear Unit: `max(0, x)`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReLU;

impl ReLU {
    /// Creates a new ReLU activation.
    pub fn new() -> Self {
        Self
    }
}

impl Layer for ReLU {
    fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError> {
        Ok(input.map(|x| x.max(0.0)))
    }

    fn parameters(&self) -> Vec<&Tensor> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "ReLU"
    }
}

/// Logistic sigmoid: `1 / (1 + e^-x)`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Sigmoid;

impl Sigmoid {
    /// Creates a new Sigmoid activation.
    pub fn new() -> Self {
        Self
    }
}

impl Layer for Sigmoid {
    fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError> {
        Ok(input.map(|x| 1.0 / (1.0 + (-x).exp())))
    }

    fn parameters(&self) -> Vec<&Tensor> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "Sigmoid"
    }
}

/// Row-wise softmax over the last axis of a 2D tensor.
///
/// Numerically stabilized by subtracting the row maximum before
/// exponentiation. Rows of width zero pass through unchanged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Softmax;

impl Softmax {
    /// Creates a new Softmax activation.
    pub fn new() -> Self {
        Self
    }
}

impl Layer for Softmax {
    fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError> {
        if input.ndim() != 2 {
            return Err(LayerError::ForwardError {
                message: format!("Softmax expects 2D input, got {}D", input.ndim()),
            });
        }

        let rows = input.shape()[0];
        let cols = input.shape()[1];
        if cols == 0 {
            return Ok(input.clone());
        }

        let mut out = input.data().to_vec();
        for r in 0..rows {
            let row = &mut out[r * cols..(r + 1) * cols];
            let max_val = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0;
            for v in row.iter_mut() {
                *v = (*v - max_val).exp();
                sum += *v;
            }
            if sum > 0.0 {
                for v in row.iter_mut() {
                    *v /= sum;
                }
            }
        }

        Ok(Tensor::from_data(input.shape(), out))
    }

    fn parameters(&self) -> Vec<&Tensor> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "Softmax"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relu() {
        let input = Tensor::from_data(&[1, 4], vec![-1.0, 0.0, 0.5, 2.0]);
        let output = ReLU::new().forward(&input).unwrap();
        assert_eq!(output.data(), &[0.0, 0.0, 0.5, 2.0]);
    }

    #[test]
    fn test_sigmoid() {
        let input = Tensor::from_data(&[1, 3], vec![0.0, 10.0, -10.0]);
        let output = Sigmoid::new().forward(&input).unwrap();
        assert!((output.data()[0] - 0.5).abs() < 1e-6);
        assert!(output.data()[1] > 0.999);
        assert!(output.data()[2] < 0.001);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let input = Tensor::from_data(&[2, 3], vec![1.0, 2.0, 3.0, -1.0, 0.0, 1.0]);
        let output = Softmax::new().forward(&input).unwrap();
        for r in 0..2 {
            let sum: f32 = output.data()[r * 3..(r + 1) * 3].iter().sum();
            assert!((sum - 1.0).abs() < 1e-6);
        }
        // Larger logits get larger weights.
        assert!(output.data()[2] > output.data()[1]);
        assert!(output.data()[1] > output.data()[0]);
    }

    #[test]
    fn test_softmax_large_values_stable() {
        let input = Tensor::from_data(&[1, 2], vec![1000.0, 1000.0]);
        let output = Softmax::new().forward(&input).unwrap();
        assert!((output.data()[0] - 0.5).abs() < 1e-6);
        assert!((output.data()[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_empty_row_axis() {
        let input = Tensor::zeros(&[3, 0]);
        let output = Softmax::new().forward(&input).unwrap();
        assert_eq!(output.shape(), &[3, 0]);
    }

    #[test]
    fn test_softmax_rejects_3d() {
        let input = Tensor::zeros(&[2, 3, 4]);
        assert!(Softmax::new().forward(&input).is_err());
    }
}
