//! Dense (fully connected) layer implementation.
//!
//! Performs the linear transformation `y = xW + b` where `W` is the weight
//! matrix and `b` the bias vector.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::LayerError;
use crate::initializer::Initializer;
use crate::layer::Layer;
use crate::tensor::Tensor;

/// A dense (fully connected) neural network layer.
///
/// Transforms input of shape `[batch_size, in_features]` into
/// `[batch_size, out_features]`.
///
/// # Example
///
/// ```
/// use afm_layers::dense::Dense;
/// use afm_layers::layer::Layer;
/// use afm_layers::tensor::Tensor;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let layer = Dense::new(128, 64, &mut rng);
/// let input = Tensor::zeros(&[32, 128]);
/// let output = layer.forward(&input).unwrap();
/// assert_eq!(output.shape(), &[32, 64]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    /// Weight matrix of shape [in_features, out_features]
    weights: Tensor,
    /// Bias vector of shape [out_features]
    bias: Tensor,
    /// Input feature dimension
    in_features: usize,
    /// Output feature dimension
    out_features: usize,
    /// Whether to use bias
    use_bias: bool,
}

impl Dense {
    /// Creates a new dense layer with Xavier-uniform weights and zero bias.
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        Self::with_initializers(
            in_features,
            out_features,
            Initializer::xavier_uniform(),
            Initializer::Zeros,
            true,
            rng,
        )
    }

    /// Creates a new dense layer without a bias term.
    pub fn new_no_bias<R: Rng + ?Sized>(
        in_features: usize,
        out_features: usize,
        rng: &mut R,
    ) -> Self {
        Self::with_initializers(
            in_features,
            out_features,
            Initializer::xavier_uniform(),
            Initializer::Zeros,
            false,
            rng,
        )
    }

    /// Creates a new dense layer with explicit initializers.
    pub fn with_initializers<R: Rng + ?Sized>(
        in_features: usize,
        out_features: usize,
        weight_init: Initializer,
        bias_init: Initializer,
        use_bias: bool,
        rng: &mut R,
    ) -> Self {
        let weights = weight_init.initialize(&[in_features, out_features], rng);
        let bias = if use_bias {
            bias_init.initialize(&[out_features], rng)
        } else {
            Tensor::zeros(&[out_features])
        };

        Self {
            weights,
            bias,
            in_features,
            out_features,
            use_bias,
        }
    }

    /// Creates a dense layer from explicit weights and bias.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes are incompatible.
    pub fn from_weights(weights: Tensor, bias: Tensor) -> Result<Self, LayerError> {
        if weights.ndim() != 2 {
            return Err(LayerError::ConfigError {
                message: format!("Weights must be 2D, got {}D", weights.ndim()),
            });
        }
        if bias.ndim() != 1 {
            return Err(LayerError::ConfigError {
                message: format!("Bias must be 1D, got {}D", bias.ndim()),
            });
        }
        if weights.shape()[1] != bias.shape()[0] {
            return Err(LayerError::ShapeMismatch {
                expected: vec![weights.shape()[1]],
                actual: bias.shape().to_vec(),
            });
        }

        let in_features = weights.shape()[0];
        let out_features = weights.shape()[1];
        Ok(Self {
            weights,
            bias,
            in_features,
            out_features,
            use_bias: true,
        })
    }

    /// Returns the input dimension.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Returns the output dimension.
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// Returns whether the layer carries a bias term.
    pub fn use_bias(&self) -> bool {
        self.use_bias
    }

    /// Returns a reference to the weight matrix.
    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    /// Returns a reference to the bias vector.
    pub fn bias(&self) -> &Tensor {
        &self.bias
    }
}

impl Layer for Dense {
    fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError> {
        if input.ndim() != 2 {
            return Err(LayerError::ForwardError {
                message: format!("Dense expects 2D input, got {}D", input.ndim()),
            });
        }
        if input.shape()[1] != self.in_features {
            return Err(LayerError::InvalidInputDimension {
                expected: self.in_features,
                actual: input.shape()[1],
            });
        }

        let output = input.matmul(&self.weights);
        if self.use_bias {
            Ok(output.add(&self.bias))
        } else {
            Ok(output)
        }
    }

    fn parameters(&self) -> Vec<&Tensor> {
        if self.use_bias {
            vec![&self.weights, &self.bias]
        } else {
            vec![&self.weights]
        }
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        if self.use_bias {
            vec![&mut self.weights, &mut self.bias]
        } else {
            vec![&mut self.weights]
        }
    }

    fn name(&self) -> &str {
        "Dense"
    }
}
