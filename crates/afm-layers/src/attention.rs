//! Pair-wise attention scoring layer.
//!
//! This module provides the [`AttentionLayer`], which assigns one softmax
//! weight to each feature-interaction vector in a sequence, conditioned on
//! the interaction content.
//!
//! # Architecture
//!
//! For an input `X` of shape `[batch_size, num_pairs, in_dim]`:
//! 1. Project each interaction vector: `relu(X · W)` with
//!    `W: [in_dim, attention_size]` and no bias
//! 2. Score against a learned context vector `h: [attention_size]`
//! 3. Normalize scores with a softmax over the pair axis
//!
//! The result is a `[batch_size, num_pairs]` weight tensor whose rows sum
//! to one.
//!
//! # Example
//!
//! ```
//! use afm_layers::attention::{AttentionConfig, AttentionLayer};
//! use afm_layers::tensor::Tensor;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(17);
//! let config = AttentionConfig::new(16, 8);
//! let layer = AttentionLayer::from_config(&config, &mut rng).unwrap();
//!
//! // Batch of 4 rows, 6 interaction vectors each
//! let interactions = Tensor::rand(&[4, 6, 16]);
//! let weights = layer.score(&interactions).unwrap();
//! assert_eq!(weights.shape(), &[4, 6]);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::{ReLU, Softmax};
use crate::dense::Dense;
use crate::error::LayerError;
use crate::initializer::Initializer;
use crate::layer::Layer;
use crate::tensor::Tensor;

/// Configuration for the attention scoring layer.
///
/// # Example
///
/// ```
/// use afm_layers::attention::AttentionConfig;
///
/// let config = AttentionConfig::new(16, 25);
/// assert_eq!(config.in_dim, 16);
/// assert_eq!(config.attention_size, 25);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttentionConfig {
    /// Dimension of the input interaction vectors
    pub in_dim: usize,
    /// Dimension of the attention projection space
    pub attention_size: usize,
}

impl AttentionConfig {
    /// Creates a new attention configuration.
    pub fn new(in_dim: usize, attention_size: usize) -> Self {
        Self {
            in_dim,
            attention_size,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), LayerError> {
        if self.in_dim == 0 {
            return Err(LayerError::ConfigError {
                message: "Attention input dimension must be positive".to_string(),
            });
        }
        if self.attention_size == 0 {
            return Err(LayerError::ConfigError {
                message: "Attention size must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Builds an [`AttentionLayer`] from this configuration.
    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> Result<AttentionLayer, LayerError> {
        AttentionLayer::from_config(&self, rng)
    }
}

/// Attention scoring layer over a sequence of interaction vectors.
///
/// Owns a bias-free projection matrix and a learned context vector; see
/// the module docs for the computation.
#[derive(Debug, Clone)]
pub struct AttentionLayer {
    /// Configuration used to build this layer
    config: AttentionConfig,
    /// Bias-free projection into the attention space
    projection: Dense,
    /// Learned context vector, shape [attention_size]
    context: Tensor,
    /// Projection activation
    relu: ReLU,
    /// Score normalization over the pair axis
    softmax: Softmax,
}

impl AttentionLayer {
    /// Creates a new attention layer.
    ///
    /// The projection matrix is Xavier-normal initialized and the context
    /// vector is drawn from a standard normal distribution.
    pub fn new<R: Rng + ?Sized>(
        in_dim: usize,
        attention_size: usize,
        rng: &mut R,
    ) -> Result<Self, LayerError> {
        Self::from_config(&AttentionConfig::new(in_dim, attention_size), rng)
    }

    /// Creates an attention layer from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config<R: Rng + ?Sized>(
        config: &AttentionConfig,
        rng: &mut R,
    ) -> Result<Self, LayerError> {
        config.validate()?;

        let projection = Dense::with_initializers(
            config.in_dim,
            config.attention_size,
            Initializer::xavier_normal(),
            Initializer::Zeros,
            false,
            rng,
        );
        let context = Initializer::standard_normal().initialize(&[config.attention_size], rng);

        Ok(Self {
            config: *config,
            projection,
            context,
            relu: ReLU::new(),
            softmax: Softmax::new(),
        })
    }

    /// Returns the input dimension.
    pub fn in_dim(&self) -> usize {
        self.config.in_dim
    }

    /// Returns the attention space dimension.
    pub fn attention_size(&self) -> usize {
        self.config.attention_size
    }

    /// Returns the L2 norm of the projection weight matrix.
    ///
    /// The context vector is deliberately excluded; only the projection
    /// matrix is regularized by the training loss.
    pub fn projection_norm(&self) -> f32 {
        self.projection.weights().norm()
    }

    /// Scores a batch of interaction sequences.
    ///
    /// # Arguments
    ///
    /// * `interactions` - Tensor of shape `[batch_size, num_pairs, in_dim]`
    ///
    /// # Returns
    ///
    /// Softmax weights of shape `[batch_size, num_pairs]`. An empty pair
    /// axis yields `[batch_size, 0]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not 3D or the last dimension does
    /// not match the configured input dimension.
    pub fn score(&self, interactions: &Tensor) -> Result<Tensor, LayerError> {
        if interactions.ndim() != 3 {
            return Err(LayerError::ForwardError {
                message: format!(
                    "Attention expects 3D input [batch, pairs, dim], got {}D",
                    interactions.ndim()
                ),
            });
        }

        let batch_size = interactions.shape()[0];
        let num_pairs = interactions.shape()[1];
        let in_dim = interactions.shape()[2];

        if in_dim != self.config.in_dim {
            return Err(LayerError::InvalidInputDimension {
                expected: self.config.in_dim,
                actual: in_dim,
            });
        }

        if num_pairs == 0 {
            return Ok(Tensor::zeros(&[batch_size, 0]));
        }

        // Collapse the batch and pair axes so the projection runs once.
        let flat = interactions.reshape(&[batch_size * num_pairs, in_dim]);
        let hidden = self.relu.forward(&self.projection.forward(&flat)?)?;

        // Dot each projected vector with the context vector.
        let attention_size = self.config.attention_size;
        let hidden_data = hidden.data();
        let context_data = self.context.data();
        let mut logits = vec![0.0f32; batch_size * num_pairs];
        for (i, logit) in logits.iter_mut().enumerate() {
            let mut dot = 0.0;
            for k in 0..attention_size {
                dot += hidden_data[i * attention_size + k] * context_data[k];
            }
            *logit = dot;
        }

        let logits = Tensor::from_data(&[batch_size, num_pairs], logits);
        self.softmax.forward(&logits)
    }
}

impl Layer for AttentionLayer {
    fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError> {
        self.score(input)
    }

    fn parameters(&self) -> Vec<&Tensor> {
        let mut params = self.projection.parameters();
        params.push(&self.context);
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = self.projection.parameters_mut();
        params.push(&mut self.context);
        params
    }

    fn name(&self) -> &str {
        "AttentionLayer"
    }
}
