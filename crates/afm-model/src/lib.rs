//! Attentional Factorization Machines (AFM) context-aware recommender.
//!
//! AFM models a target value as a first-order linear signal plus an
//! attention-weighted sum of pairwise feature interactions. This crate
//! provides:
//!
//! - **Schema**: the fixed set of input fields (tokens, token sequences,
//!   floats) a model is built against
//! - **Batches**: column-major mini-batches of input rows
//! - **Context embedding**: per-field embedding tables and the first-order
//!   linear term
//! - **Pair index**: the precomputed lexicographic set of unordered field
//!   pairs
//! - **The model**: `forward` / `predict` / `calculate_loss` over batches,
//!   with parameters exposed for an external optimizer
//!
//! # Quick Start
//!
//! ```
//! use afm_model::prelude::*;
//!
//! let schema = DatasetSchema::new()
//!     .with_field(FeatureField::token("user_id", 1000))
//!     .with_field(FeatureField::token("item_id", 5000))
//!     .with_field(FeatureField::float("age"));
//!
//! let config = AfmConfig::new("rating")
//!     .with_embedding_size(16)
//!     .with_attention_size(8);
//!
//! let mut model = AfmModel::new(&config, &schema).unwrap();
//! model.set_training(false);
//!
//! let batch = MiniBatch::new()
//!     .with_tokens("user_id", vec![12, 7])
//!     .with_tokens("item_id", vec![99, 1024])
//!     .with_floats("age", vec![31.0, 24.0])
//!     .with_floats("rating", vec![5.0, 2.0]);
//!
//! let predictions = model.predict(&batch).unwrap();
//! assert_eq!(predictions.shape(), &[2]);
//!
//! let loss = model.calculate_loss(&batch).unwrap();
//! assert!(loss.is_finite());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod afm;
pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod interaction;
pub mod loss;
pub mod schema;

// Re-export main types at crate level
pub use afm::AfmModel;
pub use batch::{FieldValues, MiniBatch};
pub use config::AfmConfig;
pub use context::ContextEmbedder;
pub use error::{ModelError, ModelResult};
pub use interaction::PairIndex;
pub use loss::RmseLoss;
pub use schema::{DatasetSchema, FeatureField, FieldKind};

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```
/// use afm_model::prelude::*;
/// ```
pub mod prelude {
    pub use crate::afm::AfmModel;
    pub use crate::batch::{FieldValues, MiniBatch};
    pub use crate::config::AfmConfig;
    pub use crate::context::ContextEmbedder;
    pub use crate::error::{ModelError, ModelResult};
    pub use crate::interaction::PairIndex;
    pub use crate::loss::RmseLoss;
    pub use crate::schema::{DatasetSchema, FeatureField, FieldKind};
    pub use afm_layers::Tensor;
}
