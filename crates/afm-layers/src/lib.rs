//! Neural network building blocks for the AFM recommender.
//!
//! This crate provides the layer primitives the model crate composes:
//!
//! - **Tensor**: a dense row-major `f32` array with the handful of ops the
//!   model needs
//! - **Dense layers**: fully connected linear transformations
//! - **Attention**: softmax scoring of feature-interaction vectors against
//!   a learned context vector
//! - **Embeddings**: dense tables with id and pooled-sequence lookup
//! - **Dropout**: inverted dropout, inert at inference
//! - **Activations**: ReLU, Sigmoid, Softmax
//! - **Initializers**: zeros/ones/constant, Xavier uniform/normal, and
//!   plain normal, all driven by a caller-supplied RNG
//!
//! # Quick Start
//!
//! ```
//! use afm_layers::prelude::*;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let attention = AttentionLayer::new(16, 8, &mut rng).unwrap();
//!
//! // Batch of 4 rows, 6 interaction vectors each
//! let interactions = Tensor::rand(&[4, 6, 16]);
//! let weights = attention.score(&interactions).unwrap();
//! assert_eq!(weights.shape(), &[4, 6]);
//! ```
//!
//! # Layer Trait
//!
//! All layers implement the [`Layer`] trait, which provides a unified
//! forward interface and parameter access for an external optimizer:
//!
//! ```
//! use afm_layers::prelude::*;
//!
//! fn run<L: Layer>(layer: &L, input: &Tensor) -> Tensor {
//!     layer.forward(input).unwrap()
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod activation;
pub mod attention;
pub mod dense;
pub mod dropout;
pub mod embedding;
pub mod error;
pub mod initializer;
pub mod layer;
pub mod tensor;

// Re-export main types at crate level
pub use activation::{ReLU, Sigmoid, Softmax};
pub use attention::{AttentionConfig, AttentionLayer};
pub use dense::Dense;
pub use dropout::Dropout;
pub use embedding::{EmbeddingTable, PoolingMode};
pub use error::{LayerError, LayerResult};
pub use initializer::Initializer;
pub use layer::Layer;
pub use tensor::Tensor;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```
/// use afm_layers::prelude::*;
/// ```
pub mod prelude {
    pub use crate::activation::{ReLU, Sigmoid, Softmax};
    pub use crate::attention::{AttentionConfig, AttentionLayer};
    pub use crate::dense::Dense;
    pub use crate::dropout::Dropout;
    pub use crate::embedding::{EmbeddingTable, PoolingMode};
    pub use crate::error::{LayerError, LayerResult};
    pub use crate::initializer::Initializer;
    pub use crate::layer::Layer;
    pub use crate::tensor::Tensor;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_prelude_imports() {
        let mut rng = StdRng::seed_from_u64(1);
        let _tensor = Tensor::zeros(&[2, 2]);
        let _dense = Dense::new(10, 5, &mut rng);
        let _relu = ReLU::new();
        let _dropout = Dropout::new(0.1).unwrap();
    }

    #[test]
    fn test_layer_composition() {
        let mut rng = StdRng::seed_from_u64(2);
        let dense = Dense::new(10, 5, &mut rng);
        let relu = ReLU::new();

        let input = Tensor::rand(&[3, 10]);
        let h = dense.forward(&input).unwrap();
        let output = relu.forward(&h).unwrap();

        assert_eq!(output.shape(), &[3, 5]);
    }

    #[test]
    fn test_embedding_to_attention_end_to_end() {
        let mut rng = StdRng::seed_from_u64(3);
        let table = EmbeddingTable::new(10, 8, Initializer::xavier_normal(), &mut rng);
        let attention = AttentionLayer::new(8, 4, &mut rng).unwrap();

        let left = table.lookup(&[0, 1, 2]).unwrap();
        let right = table.lookup(&[3, 4, 5]).unwrap();
        let interactions = left.mul(&right).reshape(&[3, 1, 8]);

        let weights = attention.score(&interactions).unwrap();
        assert_eq!(weights.shape(), &[3, 1]);
        // A single pair per row always receives full weight.
        assert!(weights.data().iter().all(|&w| (w - 1.0).abs() < 1e-6));
    }
}
