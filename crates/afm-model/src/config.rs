//! Model configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Configuration for the AFM model.
///
/// # Example
///
/// ```
/// use afm_model::config::AfmConfig;
///
/// let config = AfmConfig::new("rating")
///     .with_embedding_size(16)
///     .with_attention_size(8)
///     .with_dropout([0.2, 0.2])
///     .with_weight_decay(1e-4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AfmConfig {
    /// Name of the label column in each training batch
    pub label_field: String,
    /// Dimension of the per-field embeddings
    pub embedding_size: usize,
    /// Dimension of the attention projection space
    pub attention_size: usize,
    /// Dropout probabilities: index 0 for attention scores, index 1 for the
    /// pooled interaction vector
    pub dropout: [f32; 2],
    /// L2 coefficient applied to the attention projection matrix in the loss
    pub weight_decay: f32,
    /// Seed for parameter initialization
    pub seed: u64,
}

impl AfmConfig {
    /// Creates a configuration with the given label column and defaults
    /// matching the reference hyperparameters.
    pub fn new(label_field: impl Into<String>) -> Self {
        Self {
            label_field: label_field.into(),
            embedding_size: 10,
            attention_size: 25,
            dropout: [0.3, 0.3],
            weight_decay: 2.0,
            seed: 42,
        }
    }

    /// Sets the embedding dimension.
    pub fn with_embedding_size(mut self, embedding_size: usize) -> Self {
        self.embedding_size = embedding_size;
        self
    }

    /// Sets the attention projection dimension.
    pub fn with_attention_size(mut self, attention_size: usize) -> Self {
        self.attention_size = attention_size;
        self
    }

    /// Sets the two dropout probabilities (attention scores, pooled output).
    pub fn with_dropout(mut self, dropout: [f32; 2]) -> Self {
        self.dropout = dropout;
        self
    }

    /// Sets the L2 coefficient for the attention projection matrix.
    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Sets the initialization seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ModelResult<()> {
        if self.label_field.is_empty() {
            return Err(ModelError::Config {
                message: "Label field name must not be empty".to_string(),
            });
        }
        if self.embedding_size == 0 {
            return Err(ModelError::Config {
                message: "Embedding size must be positive".to_string(),
            });
        }
        if self.attention_size == 0 {
            return Err(ModelError::Config {
                message: "Attention size must be positive".to_string(),
            });
        }
        for (i, &rate) in self.dropout.iter().enumerate() {
            if !(0.0..1.0).contains(&rate) {
                return Err(ModelError::Config {
                    message: format!("Dropout rate {} must be in [0, 1), got {}", i, rate),
                });
            }
        }
        if self.weight_decay < 0.0 {
            return Err(ModelError::Config {
                message: format!("Weight decay must be non-negative, got {}", self.weight_decay),
            });
        }
        Ok(())
    }
}

impl Default for AfmConfig {
    fn default() -> Self {
        Self::new("label")
    }
}
