//! Mini-batch container.
//!
//! A batch is a column-major map from field name to per-row values. All
//! columns of a well-formed batch agree on the row count; the model checks
//! agreement for every column it touches.

use std::collections::BTreeMap;

use crate::error::{ModelError, ModelResult};

/// Per-row values of one batch column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValues {
    /// One categorical id per row.
    Tokens(Vec<i64>),
    /// One id sequence per row.
    TokenSeqs(Vec<Vec<i64>>),
    /// One float per row.
    Floats(Vec<f32>),
}

impl FieldValues {
    /// Returns the number of rows in the column.
    pub fn len(&self) -> usize {
        match self {
            FieldValues::Tokens(v) => v.len(),
            FieldValues::TokenSeqs(v) => v.len(),
            FieldValues::Floats(v) => v.len(),
        }
    }

    /// Returns `true` if the column holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A batch of input rows, stored column-major.
///
/// # Example
///
/// ```
/// use afm_model::batch::MiniBatch;
///
/// let batch = MiniBatch::new()
///     .with_tokens("user_id", vec![3, 7])
///     .with_floats("rating", vec![4.0, 1.5]);
/// assert_eq!(batch.batch_size(), 2);
/// assert_eq!(batch.tokens("user_id").unwrap(), &[3, 7]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MiniBatch {
    columns: BTreeMap<String, FieldValues>,
}

impl MiniBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self {
            columns: BTreeMap::new(),
        }
    }

    /// Adds a token column.
    pub fn with_tokens(mut self, name: impl Into<String>, values: Vec<i64>) -> Self {
        self.columns
            .insert(name.into(), FieldValues::Tokens(values));
        self
    }

    /// Adds a token-sequence column.
    pub fn with_token_seqs(mut self, name: impl Into<String>, values: Vec<Vec<i64>>) -> Self {
        self.columns
            .insert(name.into(), FieldValues::TokenSeqs(values));
        self
    }

    /// Adds a float column.
    pub fn with_floats(mut self, name: impl Into<String>, values: Vec<f32>) -> Self {
        self.columns
            .insert(name.into(), FieldValues::Floats(values));
        self
    }

    /// Returns the number of rows, taken from the first column.
    ///
    /// An empty batch has zero rows.
    pub fn batch_size(&self) -> usize {
        self.columns.values().next().map_or(0, FieldValues::len)
    }

    /// Returns `true` if the batch holds no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the raw column, if present.
    pub fn column(&self, name: &str) -> Option<&FieldValues> {
        self.columns.get(name)
    }

    fn expect_column(&self, name: &str) -> ModelResult<&FieldValues> {
        self.columns
            .get(name)
            .ok_or_else(|| ModelError::MissingField(name.to_string()))
    }

    /// Returns the token column with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is absent or holds a different kind.
    pub fn tokens(&self, name: &str) -> ModelResult<&[i64]> {
        match self.expect_column(name)? {
            FieldValues::Tokens(v) => Ok(v),
            _ => Err(ModelError::ColumnTypeMismatch {
                name: name.to_string(),
                expected: "tokens",
            }),
        }
    }

    /// Returns the token-sequence column with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is absent or holds a different kind.
    pub fn token_seqs(&self, name: &str) -> ModelResult<&[Vec<i64>]> {
        match self.expect_column(name)? {
            FieldValues::TokenSeqs(v) => Ok(v),
            _ => Err(ModelError::ColumnTypeMismatch {
                name: name.to_string(),
                expected: "token sequences",
            }),
        }
    }

    /// Returns the float column with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is absent or holds a different kind.
    pub fn floats(&self, name: &str) -> ModelResult<&[f32]> {
        match self.expect_column(name)? {
            FieldValues::Floats(v) => Ok(v),
            _ => Err(ModelError::ColumnTypeMismatch {
                name: name.to_string(),
                expected: "floats",
            }),
        }
    }

    /// Checks that the named column holds exactly `expected` rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is absent or its length disagrees.
    pub fn check_len(&self, name: &str, expected: usize) -> ModelResult<()> {
        let actual = self.expect_column(name)?.len();
        if actual != expected {
            return Err(ModelError::ColumnLengthMismatch {
                name: name.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}
