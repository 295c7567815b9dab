//! Attentional Factorization Machines model.
//!
//! AFM scores a row as a first-order linear signal plus an
//! attention-weighted sum of pairwise feature interactions:
//!
//! ```text
//! y = b + sum_i w_i x_i + p . sum_{i<j} a_ij (v_i * v_j)
//! ```
//!
//! where `v_i` are field embeddings, `*` is the elementwise product,
//! `a_ij` are softmax attention weights over the pairs, and `p` is a
//! learned output projection.
//!
//! # Example
//!
//! ```
//! use afm_model::afm::AfmModel;
//! use afm_model::batch::MiniBatch;
//! use afm_model::config::AfmConfig;
//! use afm_model::schema::{DatasetSchema, FeatureField};
//!
//! let schema = DatasetSchema::new()
//!     .with_field(FeatureField::token("user_id", 100))
//!     .with_field(FeatureField::token("item_id", 500));
//! let config = AfmConfig::new("rating").with_embedding_size(8);
//! let mut model = AfmModel::new(&config, &schema).unwrap();
//! model.set_training(false);
//!
//! let batch = MiniBatch::new()
//!     .with_tokens("user_id", vec![3, 7])
//!     .with_tokens("item_id", vec![42, 9]);
//! let predictions = model.predict(&batch).unwrap();
//! assert_eq!(predictions.shape(), &[2]);
//! ```
//!
//! # References
//!
//! - Xiao, J., et al. "Attentional Factorization Machines: Learning the
//!   Weight of Feature Interactions via Attention Networks." IJCAI 2017.

use rand::rngs::StdRng;
use rand::SeedableRng;

use afm_layers::{AttentionLayer, Dropout, Initializer, Layer, Tensor};

use crate::batch::MiniBatch;
use crate::config::AfmConfig;
use crate::context::ContextEmbedder;
use crate::error::{ModelError, ModelResult};
use crate::interaction::PairIndex;
use crate::loss::RmseLoss;
use crate::schema::DatasetSchema;

/// The AFM context-aware recommender.
///
/// Owns every learned parameter for its whole lifetime; parameters are
/// mutated only through [`AfmModel::parameters_mut`] by an external
/// optimizer, never during a forward pass.
#[derive(Debug, Clone)]
pub struct AfmModel {
    config: AfmConfig,
    embedder: ContextEmbedder,
    pairs: PairIndex,
    attention: AttentionLayer,
    /// Output projection vector `p`, shape [embedding_size]
    projection: Tensor,
    /// Dropout over attention scores
    score_dropout: Dropout,
    /// Dropout over the pooled interaction vector
    pooling_dropout: Dropout,
    loss: RmseLoss,
    training: bool,
}

impl AfmModel {
    /// Builds the model for a configuration and dataset schema.
    ///
    /// All parameters are initialized from the config seed: Xavier-normal
    /// for embedding and weight matrices, zeros for the bias, standard
    /// normal for the projection vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or schema is invalid.
    pub fn new(config: &AfmConfig, schema: &DatasetSchema) -> ModelResult<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let embedder = ContextEmbedder::new(schema, config.embedding_size, &mut rng)?;
        let pairs = PairIndex::new(embedder.num_interacting_fields());
        let attention =
            AttentionLayer::new(config.embedding_size, config.attention_size, &mut rng)?;
        let projection =
            Initializer::standard_normal().initialize(&[config.embedding_size], &mut rng);
        let score_dropout = Dropout::new(config.dropout[0])?;
        let pooling_dropout = Dropout::new(config.dropout[1])?;

        tracing::debug!(
            fields = schema.num_fields(),
            interacting = embedder.num_interacting_fields(),
            pairs = pairs.num_pairs(),
            embedding_size = config.embedding_size,
            attention_size = config.attention_size,
            "constructed AFM model"
        );

        Ok(Self {
            config: config.clone(),
            embedder,
            pairs,
            attention,
            projection,
            score_dropout,
            pooling_dropout,
            loss: RmseLoss::new(),
            training: true,
        })
    }

    /// Returns the model configuration.
    pub fn config(&self) -> &AfmConfig {
        &self.config
    }

    /// Returns the number of feature pairs the model attends over.
    pub fn num_pairs(&self) -> usize {
        self.pairs.num_pairs()
    }

    /// Returns whether the model is in training mode.
    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Sets training mode; dropout is inert at inference.
    pub fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    /// Returns the L2 norm of the attention projection matrix.
    pub fn attention_weight_norm(&self) -> f32 {
        self.attention.projection_norm()
    }

    /// Attention-weighted pooling of pairwise interactions.
    ///
    /// # Arguments
    ///
    /// * `embeddings` - Tensor of shape `[batch_size, num_fields, dim]`
    ///
    /// # Returns
    ///
    /// The second-order interaction signal, shape `[batch_size, 1]`.
    /// An empty pair set yields exact zeros.
    fn interaction_pooling(&self, embeddings: &Tensor) -> ModelResult<Tensor> {
        let batch_size = embeddings.shape()[0];
        let num_pairs = self.pairs.num_pairs();
        if num_pairs == 0 {
            return Ok(Tensor::zeros(&[batch_size, 1]));
        }

        let (left, right) = self.pairs.gather(embeddings)?;
        let interactions = left.mul(&right); // [batch, pairs, dim]

        let scores = self.attention.score(&interactions)?; // [batch, pairs]
        let scores = self.score_dropout.apply(&scores, self.training);

        // Weighted sum over the pair axis.
        let dim = self.embedder.embedding_size();
        let mut pooled = vec![0.0f32; batch_size * dim];
        let score_data = scores.data();
        let inter_data = interactions.data();
        for b in 0..batch_size {
            for k in 0..num_pairs {
                let weight = score_data[b * num_pairs + k];
                let offset = (b * num_pairs + k) * dim;
                for d in 0..dim {
                    pooled[b * dim + d] += weight * inter_data[offset + d];
                }
            }
        }
        let pooled = Tensor::from_data(&[batch_size, dim], pooled);
        let pooled = self.pooling_dropout.apply(&pooled, self.training);

        // Project down to one scalar per row.
        let projection = self.projection.data();
        let pooled_data = pooled.data();
        let mut out = vec![0.0f32; batch_size];
        for b in 0..batch_size {
            let mut dot = 0.0;
            for d in 0..dim {
                dot += pooled_data[b * dim + d] * projection[d];
            }
            out[b] = dot;
        }

        Ok(Tensor::from_data(&[batch_size, 1], out))
    }

    /// Computes the raw prediction for each row of a batch.
    ///
    /// # Returns
    ///
    /// Tensor of shape `[batch_size]`. The output is the unsquashed sum of
    /// the first-order and second-order signals.
    pub fn forward(&self, batch: &MiniBatch) -> ModelResult<Tensor> {
        let embedded = self.embedder.embed_fields(batch)?;
        let first_order = self.embedder.first_order(batch)?;
        let second_order = self.interaction_pooling(&embedded)?;

        let batch_size = batch.batch_size();
        Ok(first_order.add(&second_order).reshape(&[batch_size]))
    }

    /// Inference-time alias of [`AfmModel::forward`].
    pub fn predict(&self, batch: &MiniBatch) -> ModelResult<Tensor> {
        self.forward(batch)
    }

    /// Computes the training loss for a labeled batch.
    ///
    /// The loss is `sqrt(MSE(prediction, label))` plus `weight_decay`
    /// times the L2 norm of the attention projection matrix. Other
    /// parameters are unregularized, so weight decay never changes
    /// predictions.
    ///
    /// # Errors
    ///
    /// Returns an error if the label column is missing or batch shapes
    /// disagree.
    pub fn calculate_loss(&self, batch: &MiniBatch) -> ModelResult<f32> {
        let labels = batch
            .floats(&self.config.label_field)
            .map_err(|err| match err {
                ModelError::MissingField(name) => ModelError::MissingLabel(name),
                other => other,
            })?;
        let labels = Tensor::from_data(&[labels.len()], labels.to_vec());

        let predictions = self.forward(batch)?;
        let rmse = self.loss.forward(&predictions, &labels)?;
        let regularization = self.config.weight_decay * self.attention.projection_norm();

        tracing::debug!(
            rmse = rmse as f64,
            regularization = regularization as f64,
            "computed training loss"
        );

        Ok(rmse + regularization)
    }

    /// Returns the attention weight assigned to every feature pair,
    /// without dropout.
    ///
    /// # Returns
    ///
    /// Tensor of shape `[batch_size, num_pairs]`; rows sum to one when the
    /// pair set is non-empty.
    pub fn interaction_weights(&self, batch: &MiniBatch) -> ModelResult<Tensor> {
        let embedded = self.embedder.embed_fields(batch)?;
        let num_pairs = self.pairs.num_pairs();
        if num_pairs == 0 {
            return Ok(Tensor::zeros(&[batch.batch_size(), 0]));
        }
        let (left, right) = self.pairs.gather(&embedded)?;
        Ok(self.attention.score(&left.mul(&right))?)
    }

    /// Returns mutable references to every learned parameter.
    ///
    /// This is the seam an external optimizer updates between forward
    /// passes.
    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = self.embedder.parameters_mut();
        params.extend(self.attention.parameters_mut());
        params.push(&mut self.projection);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FeatureField;
    use afm_layers::Layer;

    fn schema() -> DatasetSchema {
        DatasetSchema::new()
            .with_field(FeatureField::token("user", 10))
            .with_field(FeatureField::token("item", 20))
            .with_field(FeatureField::embedded_float("price"))
            .with_field(FeatureField::float("age"))
    }

    fn batch() -> MiniBatch {
        MiniBatch::new()
            .with_tokens("user", vec![1, 4, 9])
            .with_tokens("item", vec![0, 17, 3])
            .with_floats("price", vec![1.5, 0.2, 3.0])
            .with_floats("age", vec![30.0, 22.0, 57.0])
            .with_floats("rating", vec![4.0, 1.0, 3.5])
    }

    fn config() -> AfmConfig {
        AfmConfig::new("rating")
            .with_embedding_size(8)
            .with_attention_size(4)
    }

    fn eval_model() -> AfmModel {
        let mut model = AfmModel::new(&config(), &schema()).unwrap();
        model.set_training(false);
        model
    }

    #[test]
    fn test_construction() {
        let model = eval_model();
        // Three interacting fields: user, item, price.
        assert_eq!(model.num_pairs(), 3);
        assert!(model.attention_weight_norm() > 0.0);
    }

    #[test]
    fn test_forward_shape() {
        let model = eval_model();
        let predictions = model.forward(&batch()).unwrap();
        assert_eq!(predictions.shape(), &[3]);
        assert!(predictions.data().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_predict_is_forward() {
        let model = eval_model();
        assert_eq!(
            model.predict(&batch()).unwrap(),
            model.forward(&batch()).unwrap()
        );
    }

    #[test]
    fn test_inference_is_deterministic() {
        let model = eval_model();
        let a = model.forward(&batch()).unwrap();
        let b = model.forward(&batch()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_field_prediction_is_first_order() {
        let schema = DatasetSchema::new().with_field(FeatureField::token("user", 10));
        let mut model = AfmModel::new(&config(), &schema).unwrap();
        model.set_training(false);
        assert_eq!(model.num_pairs(), 0);

        let batch = MiniBatch::new().with_tokens("user", vec![2, 5]);
        let predictions = model.forward(&batch).unwrap();
        let first_order = model.embedder.first_order(&batch).unwrap();
        assert_eq!(predictions.data(), first_order.data());
    }

    #[test]
    fn test_loss_formula() {
        let model = eval_model();
        let batch = batch();

        let predictions = model.forward(&batch).unwrap();
        let labels = Tensor::from_data(&[3], batch.floats("rating").unwrap().to_vec());
        let rmse = RmseLoss::new().forward(&predictions, &labels).unwrap();
        let expected = rmse + model.config().weight_decay * model.attention_weight_norm();

        let actual = model.calculate_loss(&batch).unwrap();
        assert!((actual - expected).abs() < 1e-5);
    }

    #[test]
    fn test_weight_decay_only_affects_loss() {
        let schema = schema();
        let batch = batch();

        let mut plain = AfmModel::new(&config().with_weight_decay(0.0), &schema).unwrap();
        let mut decayed = AfmModel::new(&config().with_weight_decay(2.0), &schema).unwrap();
        plain.set_training(false);
        decayed.set_training(false);

        assert_eq!(
            plain.forward(&batch).unwrap(),
            decayed.forward(&batch).unwrap()
        );
        let plain_loss = plain.calculate_loss(&batch).unwrap();
        let decayed_loss = decayed.calculate_loss(&batch).unwrap();
        assert!(decayed_loss > plain_loss);
    }

    #[test]
    fn test_interaction_weights_sum_to_one() {
        let model = eval_model();
        let weights = model.interaction_weights(&batch()).unwrap();
        assert_eq!(weights.shape(), &[3, 3]);
        for row in 0..3 {
            let sum: f32 = weights.data()[row * 3..(row + 1) * 3].iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
            assert!(weights.data()[row * 3..(row + 1) * 3]
                .iter()
                .all(|&w| w >= 0.0));
        }
    }

    #[test]
    fn test_missing_label() {
        let model = eval_model();
        let unlabeled = MiniBatch::new()
            .with_tokens("user", vec![1])
            .with_tokens("item", vec![0])
            .with_floats("price", vec![1.0])
            .with_floats("age", vec![20.0]);
        assert!(matches!(
            model.calculate_loss(&unlabeled),
            Err(ModelError::MissingLabel(_))
        ));
    }

    #[test]
    fn test_training_mode_toggles() {
        let mut model = AfmModel::new(&config(), &schema()).unwrap();
        assert!(model.is_training());
        model.set_training(false);
        assert!(!model.is_training());
    }

    #[test]
    fn test_same_seed_same_model() {
        let mut a = AfmModel::new(&config().with_seed(99), &schema()).unwrap();
        let mut b = AfmModel::new(&config().with_seed(99), &schema()).unwrap();
        a.set_training(false);
        b.set_training(false);
        assert_eq!(a.forward(&batch()).unwrap(), b.forward(&batch()).unwrap());
    }

    #[test]
    fn test_parameters_mut_covers_attention_and_projection() {
        let mut model = AfmModel::new(&config(), &schema()).unwrap();
        // 3 embeddings + 4 first-order tables + bias + 2 attention + projection.
        assert_eq!(model.parameters_mut().len(), 11);
    }

    #[test]
    fn test_optimizer_updates_flow_into_predictions() {
        let mut model = eval_model();
        let before = model.forward(&batch()).unwrap();

        for param in model.parameters_mut() {
            for v in param.data_mut() {
                *v += 0.1;
            }
        }

        let after = model.forward(&batch()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_attention_layer_name() {
        let model = eval_model();
        assert_eq!(model.attention.name(), "AttentionLayer");
    }
}
