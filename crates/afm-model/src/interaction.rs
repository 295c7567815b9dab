//! Pairwise interaction index.
//!
//! Precomputes the unordered field pairs once at model construction; the
//! same index is reused by every forward pass.

use afm_layers::{LayerError, Tensor};
use serde::{Deserialize, Serialize};

/// Lexicographic index over the unordered pairs of field slots.
///
/// For `n` fields the index holds exactly `n * (n - 1) / 2` pairs
/// `(row[k], col[k])` with `row[k] < col[k]`, ordered lexicographically.
/// Zero or one field yields an empty index.
///
/// # Example
///
/// ```
/// use afm_model::interaction::PairIndex;
///
/// let pairs = PairIndex::new(3);
/// assert_eq!(pairs.num_pairs(), 3);
/// assert_eq!(pairs.pairs().collect::<Vec<_>>(), vec![(0, 1), (0, 2), (1, 2)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairIndex {
    num_fields: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
}

impl PairIndex {
    /// Builds the pair index for `num_fields` field slots.
    pub fn new(num_fields: usize) -> Self {
        let mut rows = Vec::new();
        let mut cols = Vec::new();
        for i in 0..num_fields.saturating_sub(1) {
            for j in (i + 1)..num_fields {
                rows.push(i);
                cols.push(j);
            }
        }
        Self {
            num_fields,
            rows,
            cols,
        }
    }

    /// Returns the number of field slots the index was built for.
    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    /// Returns the number of unordered pairs.
    pub fn num_pairs(&self) -> usize {
        self.rows.len()
    }

    /// Iterates the pairs in index order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().copied().zip(self.cols.iter().copied())
    }

    /// Gathers the left and right member of every pair.
    ///
    /// # Arguments
    ///
    /// * `embeddings` - Tensor of shape `[batch_size, num_fields, dim]`
    ///
    /// # Returns
    ///
    /// Two tensors of shape `[batch_size, num_pairs, dim]`; position `k`
    /// of each holds the embeddings of fields `row[k]` and `col[k]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not 3D or its field axis does not
    /// match the index.
    pub fn gather(&self, embeddings: &Tensor) -> Result<(Tensor, Tensor), LayerError> {
        if embeddings.ndim() != 3 {
            return Err(LayerError::ForwardError {
                message: format!(
                    "Pair gather expects 3D input [batch, fields, dim], got {}D",
                    embeddings.ndim()
                ),
            });
        }
        if embeddings.shape()[1] != self.num_fields {
            return Err(LayerError::ShapeMismatch {
                expected: vec![embeddings.shape()[0], self.num_fields, embeddings.shape()[2]],
                actual: embeddings.shape().to_vec(),
            });
        }

        let batch_size = embeddings.shape()[0];
        let dim = embeddings.shape()[2];
        let num_pairs = self.num_pairs();
        let data = embeddings.data();

        let mut left = vec![0.0f32; batch_size * num_pairs * dim];
        let mut right = vec![0.0f32; batch_size * num_pairs * dim];
        for b in 0..batch_size {
            let in_base = b * self.num_fields * dim;
            let out_base = b * num_pairs * dim;
            for k in 0..num_pairs {
                let row_offset = in_base + self.rows[k] * dim;
                let col_offset = in_base + self.cols[k] * dim;
                let out_offset = out_base + k * dim;
                left[out_offset..out_offset + dim]
                    .copy_from_slice(&data[row_offset..row_offset + dim]);
                right[out_offset..out_offset + dim]
                    .copy_from_slice(&data[col_offset..col_offset + dim]);
            }
        }

        Ok((
            Tensor::from_data(&[batch_size, num_pairs, dim], left),
            Tensor::from_data(&[batch_size, num_pairs, dim], right),
        ))
    }
}
