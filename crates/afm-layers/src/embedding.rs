//! Dense embedding tables for categorical features.
//!
//! Vocabularies here are fixed at model construction, so embeddings are
//! stored as one dense `[vocab_size, dim]` matrix per table rather than a
//! growable hash table.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::LayerError;
use crate::initializer::Initializer;
use crate::tensor::Tensor;

/// Pooling mode for sequence lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PoolingMode {
    /// Sum the embeddings of a sequence.
    Sum,
    /// Average the embeddings of a sequence.
    #[default]
    Mean,
}

/// A dense embedding table.
///
/// # Example
///
/// ```
/// use afm_layers::embedding::EmbeddingTable;
/// use afm_layers::initializer::Initializer;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let mut rng = StdRng::seed_from_u64(3);
/// let table = EmbeddingTable::new(100, 16, Initializer::xavier_normal(), &mut rng);
/// let embeddings = table.lookup(&[1, 42, 1]).unwrap();
/// assert_eq!(embeddings.shape(), &[3, 16]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingTable {
    /// Embedding matrix of shape [vocab_size, dim]
    weights: Tensor,
    /// Number of rows in the table
    vocab_size: usize,
    /// Embedding dimension
    dim: usize,
}

impl EmbeddingTable {
    /// Creates a table with the given vocabulary size and dimension.
    pub fn new<R: Rng + ?Sized>(
        vocab_size: usize,
        dim: usize,
        initializer: Initializer,
        rng: &mut R,
    ) -> Self {
        let weights = initializer.initialize(&[vocab_size, dim], rng);
        Self {
            weights,
            vocab_size,
            dim,
        }
    }

    /// Returns the vocabulary size.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Returns the embedding dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns a reference to the embedding matrix.
    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    /// Returns a mutable reference to the embedding matrix.
    pub fn weights_mut(&mut self) -> &mut Tensor {
        &mut self.weights
    }

    fn check_id(&self, id: i64) -> Result<usize, LayerError> {
        if id < 0 || id as usize >= self.vocab_size {
            return Err(LayerError::EmbeddingError {
                message: format!("id {} out of range for vocabulary of {}", id, self.vocab_size),
            });
        }
        Ok(id as usize)
    }

    /// Looks up one embedding per id.
    ///
    /// # Returns
    ///
    /// Tensor of shape `[ids.len(), dim]`.
    ///
    /// # Errors
    ///
    /// Returns an error if any id falls outside the vocabulary.
    pub fn lookup(&self, ids: &[i64]) -> Result<Tensor, LayerError> {
        let mut data = vec![0.0f32; ids.len() * self.dim];
        let weights = self.weights.data();
        for (row, &id) in ids.iter().enumerate() {
            let idx = self.check_id(id)?;
            data[row * self.dim..(row + 1) * self.dim]
                .copy_from_slice(&weights[idx * self.dim..(idx + 1) * self.dim]);
        }
        Ok(Tensor::from_data(&[ids.len(), self.dim], data))
    }

    /// Looks up and pools one embedding per id sequence.
    ///
    /// Empty sequences contribute a zero vector.
    ///
    /// # Returns
    ///
    /// Tensor of shape `[sequences.len(), dim]`.
    ///
    /// # Errors
    ///
    /// Returns an error if any id falls outside the vocabulary.
    pub fn lookup_pooled(
        &self,
        sequences: &[Vec<i64>],
        mode: PoolingMode,
    ) -> Result<Tensor, LayerError> {
        let mut data = vec![0.0f32; sequences.len() * self.dim];
        let weights = self.weights.data();
        for (row, sequence) in sequences.iter().enumerate() {
            if sequence.is_empty() {
                continue;
            }
            let out = &mut data[row * self.dim..(row + 1) * self.dim];
            for &id in sequence {
                let idx = self.check_id(id)?;
                for (o, w) in out
                    .iter_mut()
                    .zip(&weights[idx * self.dim..(idx + 1) * self.dim])
                {
                    *o += w;
                }
            }
            if mode == PoolingMode::Mean {
                let inv = 1.0 / sequence.len() as f32;
                for o in out.iter_mut() {
                    *o *= inv;
                }
            }
        }
        Ok(Tensor::from_data(&[sequences.len(), self.dim], data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table() -> EmbeddingTable {
        let mut rng = StdRng::seed_from_u64(31);
        EmbeddingTable::new(4, 3, Initializer::xavier_normal(), &mut rng)
    }

    fn constant_table(value: f32) -> EmbeddingTable {
        let mut rng = StdRng::seed_from_u64(0);
        EmbeddingTable::new(4, 3, Initializer::Constant(value), &mut rng)
    }

    #[test]
    fn test_lookup_shape_and_repeats() {
        let table = table();
        let out = table.lookup(&[0, 3, 0]).unwrap();
        assert_eq!(out.shape(), &[3, 3]);
        // Repeated ids produce identical rows.
        assert_eq!(out.data()[0..3], out.data()[6..9]);
    }

    #[test]
    fn test_lookup_out_of_range() {
        let table = table();
        assert!(table.lookup(&[4]).is_err());
        assert!(table.lookup(&[-1]).is_err());
    }

    #[test]
    fn test_pooled_mean() {
        let table = constant_table(2.0);
        let out = table
            .lookup_pooled(&[vec![0, 1, 2]], PoolingMode::Mean)
            .unwrap();
        assert_eq!(out.shape(), &[1, 3]);
        for &v in out.data() {
            assert!((v - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_pooled_sum() {
        let table = constant_table(2.0);
        let out = table
            .lookup_pooled(&[vec![0, 1, 2]], PoolingMode::Sum)
            .unwrap();
        for &v in out.data() {
            assert!((v - 6.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_pooled_empty_sequence_is_zero() {
        let table = table();
        let out = table
            .lookup_pooled(&[vec![], vec![1]], PoolingMode::Mean)
            .unwrap();
        assert_eq!(out.shape(), &[2, 3]);
        assert!(out.data()[0..3].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_pooled_out_of_range() {
        let table = table();
        assert!(table
            .lookup_pooled(&[vec![0, 9]], PoolingMode::Mean)
            .is_err());
    }

    #[test]
    fn test_weights_mut_updates_lookup() {
        let mut table = constant_table(1.0);
        table.weights_mut().data_mut()[0] = 5.0;
        let out = table.lookup(&[0]).unwrap();
        assert_eq!(out.data()[0], 5.0);
    }
}
