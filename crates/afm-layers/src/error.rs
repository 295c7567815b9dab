//! Error types for the afm-layers crate.

use thiserror::Error;

/// Error type for layer operations.
#[derive(Debug, Error)]
pub enum LayerError {
    /// Shape mismatch between expected and actual tensor shapes.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The expected shape
        expected: Vec<usize>,
        /// The actual shape that was provided
        actual: Vec<usize>,
    },

    /// Invalid input dimension for the layer.
    #[error("Invalid input dimension: expected {expected}, got {actual}")]
    InvalidInputDimension {
        /// The expected input dimension
        expected: usize,
        /// The actual input dimension
        actual: usize,
    },

    /// Error during forward pass computation.
    #[error("Forward pass error: {message}")]
    ForwardError {
        /// Description of the forward pass error
        message: String,
    },

    /// Configuration error for the layer.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Embedding lookup error.
    #[error("Embedding lookup error: {message}")]
    EmbeddingError {
        /// Description of the embedding error
        message: String,
    },
}

/// Result type alias for layer operations.
pub type LayerResult<T> = Result<T, LayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LayerError::ShapeMismatch {
            expected: vec![32, 64],
            actual: vec![32, 128],
        };
        assert!(err.to_string().contains("Shape mismatch"));

        let err = LayerError::InvalidInputDimension {
            expected: 64,
            actual: 128,
        };
        assert!(err.to_string().contains("Invalid input dimension"));

        let err = LayerError::EmbeddingError {
            message: "id out of range".to_string(),
        };
        assert!(err.to_string().contains("Embedding lookup error"));
    }
}
