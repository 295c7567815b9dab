//! Error types for the afm-model crate.

use afm_layers::LayerError;
use thiserror::Error;

/// Error type for model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A batch column referenced by the schema is missing.
    #[error("Missing feature field: {0}")]
    MissingField(String),

    /// The configured label column is missing from the batch.
    #[error("Missing label column: {0}")]
    MissingLabel(String),

    /// A batch column holds values of the wrong kind for its field.
    #[error("Column '{name}' holds the wrong value kind: expected {expected}")]
    ColumnTypeMismatch {
        /// The column name
        name: String,
        /// The expected value kind
        expected: &'static str,
    },

    /// A batch column disagrees with the batch size.
    #[error("Column '{name}' holds {actual} rows, expected {expected}")]
    ColumnLengthMismatch {
        /// The column name
        name: String,
        /// The expected number of rows
        expected: usize,
        /// The actual number of rows
        actual: usize,
    },

    /// A token sequence exceeds the schema's declared maximum length.
    #[error("Sequence in column '{name}' has {actual} tokens, maximum is {max_len}")]
    SequenceTooLong {
        /// The column name
        name: String,
        /// The declared maximum sequence length
        max_len: usize,
        /// The offending sequence length
        actual: usize,
    },

    /// Predictions and labels disagree on batch size.
    #[error("Predictions and labels disagree on batch size: {predictions} vs {labels}")]
    BatchSizeMismatch {
        /// Number of predictions
        predictions: usize,
        /// Number of labels
        labels: usize,
    },

    /// Invalid configuration or schema.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// Error raised by an underlying layer.
    #[error(transparent)]
    Layer(#[from] LayerError),
}

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
