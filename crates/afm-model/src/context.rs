//! Context field embedder and first-order linear term.
//!
//! Owns every per-field parameter table: one embedding table per
//! interacting field, one first-order weight table per field, and the
//! global first-order bias. Parameter groups are initialized by kind:
//! Xavier-normal for embedding and weight matrices, zeros for the bias.

use rand::Rng;
use rayon::prelude::*;

use afm_layers::{EmbeddingTable, Initializer, PoolingMode, Tensor};

use crate::batch::MiniBatch;
use crate::error::{ModelError, ModelResult};
use crate::schema::{DatasetSchema, FeatureField, FieldKind};

/// Parameter tables for one schema field.
#[derive(Debug, Clone)]
struct FieldSlot {
    field: FeatureField,
    /// Embedding table; absent for non-embedded float fields
    embedding: Option<EmbeddingTable>,
    /// First-order weight table with output dimension 1
    first_order: EmbeddingTable,
}

/// Converts batch columns into dense field embeddings and a first-order
/// linear signal.
///
/// Field order follows the schema; interacting fields occupy embedding
/// slots in that same order.
#[derive(Debug, Clone)]
pub struct ContextEmbedder {
    slots: Vec<FieldSlot>,
    embedding_size: usize,
    /// Global first-order bias, shape [1]
    bias: Tensor,
}

impl ContextEmbedder {
    /// Builds the embedder for a schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is invalid.
    pub fn new<R: Rng + ?Sized>(
        schema: &DatasetSchema,
        embedding_size: usize,
        rng: &mut R,
    ) -> ModelResult<Self> {
        schema.validate()?;

        let embedding_init = Initializer::xavier_normal();
        let mut slots = Vec::with_capacity(schema.num_fields());
        for field in schema.fields() {
            let (vocab_size, embedded) = match field.kind() {
                FieldKind::Token { vocab_size } => (vocab_size, true),
                FieldKind::TokenSeq { vocab_size, .. } => (vocab_size, true),
                FieldKind::Float { embedded } => (1, embedded),
            };
            let embedding = embedded
                .then(|| EmbeddingTable::new(vocab_size, embedding_size, embedding_init, rng));
            let first_order = EmbeddingTable::new(vocab_size, 1, embedding_init, rng);
            slots.push(FieldSlot {
                field: field.clone(),
                embedding,
                first_order,
            });
        }

        let bias = Initializer::Zeros.initialize(&[1], rng);

        Ok(Self {
            slots,
            embedding_size,
            bias,
        })
    }

    /// Returns the embedding dimension.
    pub fn embedding_size(&self) -> usize {
        self.embedding_size
    }

    /// Returns the number of fields that occupy embedding slots.
    pub fn num_interacting_fields(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.field.is_interacting())
            .count()
    }

    /// Embeds every interacting field of a batch.
    ///
    /// # Returns
    ///
    /// Tensor of shape `[batch_size, num_interacting_fields, embedding_size]`,
    /// fields in schema order.
    ///
    /// # Errors
    ///
    /// Returns an error for missing columns, wrong column kinds, column
    /// length disagreements, over-long sequences, or out-of-vocabulary ids.
    pub fn embed_fields(&self, batch: &MiniBatch) -> ModelResult<Tensor> {
        let batch_size = batch.batch_size();
        let dim = self.embedding_size;

        let mut per_field = Vec::new();
        for slot in &self.slots {
            let Some(table) = &slot.embedding else {
                continue;
            };
            per_field.push(self.embed_slot(slot, table, batch, batch_size)?);
        }

        let num_fields = per_field.len();
        if num_fields == 0 {
            return Ok(Tensor::zeros(&[batch_size, 0, dim]));
        }

        // Interleave the [batch, dim] field tensors into [batch, fields, dim].
        let mut data = vec![0.0f32; batch_size * num_fields * dim];
        data.par_chunks_mut(num_fields * dim)
            .enumerate()
            .for_each(|(row, chunk)| {
                for (slot_idx, field_tensor) in per_field.iter().enumerate() {
                    chunk[slot_idx * dim..(slot_idx + 1) * dim]
                        .copy_from_slice(&field_tensor.data()[row * dim..(row + 1) * dim]);
                }
            });

        Ok(Tensor::from_data(&[batch_size, num_fields, dim], data))
    }

    fn embed_slot(
        &self,
        slot: &FieldSlot,
        table: &EmbeddingTable,
        batch: &MiniBatch,
        batch_size: usize,
    ) -> ModelResult<Tensor> {
        let name = slot.field.name();
        batch.check_len(name, batch_size)?;

        match slot.field.kind() {
            FieldKind::Token { .. } => Ok(table.lookup(batch.tokens(name)?)?),
            FieldKind::TokenSeq { max_len, .. } => {
                let sequences = batch.token_seqs(name)?;
                for sequence in sequences {
                    if sequence.len() > max_len {
                        return Err(ModelError::SequenceTooLong {
                            name: name.to_string(),
                            max_len,
                            actual: sequence.len(),
                        });
                    }
                }
                Ok(table.lookup_pooled(sequences, PoolingMode::Mean)?)
            }
            FieldKind::Float { .. } => {
                // One learned vector per float field, scaled by the row value.
                let values = batch.floats(name)?;
                let mut embedded = table.lookup(&vec![0i64; batch_size])?;
                let dim = self.embedding_size;
                for (row, &value) in values.iter().enumerate() {
                    for v in &mut embedded.data_mut()[row * dim..(row + 1) * dim] {
                        *v *= value;
                    }
                }
                Ok(embedded)
            }
        }
    }

    /// Computes the first-order linear term of a batch.
    ///
    /// Every field contributes, including non-embedded floats.
    ///
    /// # Returns
    ///
    /// Tensor of shape `[batch_size, 1]`.
    pub fn first_order(&self, batch: &MiniBatch) -> ModelResult<Tensor> {
        let batch_size = batch.batch_size();
        let mut out = vec![self.bias.data()[0]; batch_size];

        for slot in &self.slots {
            let name = slot.field.name();
            batch.check_len(name, batch_size)?;

            match slot.field.kind() {
                FieldKind::Token { .. } => {
                    let weights = slot.first_order.lookup(batch.tokens(name)?)?;
                    for (o, w) in out.iter_mut().zip(weights.data()) {
                        *o += w;
                    }
                }
                FieldKind::TokenSeq { .. } => {
                    let weights = slot
                        .first_order
                        .lookup_pooled(batch.token_seqs(name)?, PoolingMode::Mean)?;
                    for (o, w) in out.iter_mut().zip(weights.data()) {
                        *o += w;
                    }
                }
                FieldKind::Float { .. } => {
                    let weight = slot.first_order.weights().data()[0];
                    for (o, &v) in out.iter_mut().zip(batch.floats(name)?) {
                        *o += weight * v;
                    }
                }
            }
        }

        Ok(Tensor::from_data(&[batch_size, 1], out))
    }

    /// Returns mutable references to every parameter table.
    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = Vec::new();
        for slot in &mut self.slots {
            if let Some(embedding) = &mut slot.embedding {
                params.push(embedding.weights_mut());
            }
            params.push(slot.first_order.weights_mut());
        }
        params.push(&mut self.bias);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FeatureField;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn schema() -> DatasetSchema {
        DatasetSchema::new()
            .with_field(FeatureField::token("user", 10))
            .with_field(FeatureField::token_seq("history", 10, 4))
            .with_field(FeatureField::embedded_float("price"))
            .with_field(FeatureField::float("age"))
    }

    fn batch() -> MiniBatch {
        MiniBatch::new()
            .with_tokens("user", vec![1, 2])
            .with_token_seqs("history", vec![vec![0, 1], vec![]])
            .with_floats("price", vec![2.0, 0.5])
            .with_floats("age", vec![30.0, 41.0])
    }

    fn embedder() -> ContextEmbedder {
        let mut rng = StdRng::seed_from_u64(13);
        ContextEmbedder::new(&schema(), 6, &mut rng).unwrap()
    }

    #[test]
    fn test_embed_fields_shape() {
        let embedder = embedder();
        let embedded = embedder.embed_fields(&batch()).unwrap();
        // "age" is first-order only: 3 interacting fields remain.
        assert_eq!(embedded.shape(), &[2, 3, 6]);
        assert_eq!(embedder.num_interacting_fields(), 3);
    }

    #[test]
    fn test_embedded_float_scales_by_value() {
        let embedder = embedder();
        let embedded = embedder.embed_fields(&batch()).unwrap();

        // Slot 2 is "price"; its table has a single row.
        let table = embedder.slots[2].embedding.as_ref().unwrap();
        let base = table.weights().data();
        let dim = 6;
        let row0 = &embedded.data()[2 * dim..3 * dim];
        for (v, b) in row0.iter().zip(base) {
            assert!((v - 2.0 * b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_sequence_embeds_to_zero() {
        let embedder = embedder();
        let embedded = embedder.embed_fields(&batch()).unwrap();
        let dim = 6;
        // Row 1, slot 1 ("history") was an empty sequence.
        let offset = (3 + 1) * dim;
        assert!(embedded.data()[offset..offset + dim].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_first_order_shape() {
        let embedder = embedder();
        let first = embedder.first_order(&batch()).unwrap();
        assert_eq!(first.shape(), &[2, 1]);
    }

    #[test]
    fn test_first_order_includes_plain_floats() {
        let embedder = embedder();
        let base = embedder.first_order(&batch()).unwrap();

        let mut shifted_batch = batch();
        shifted_batch = shifted_batch.with_floats("age", vec![31.0, 41.0]);
        let shifted = embedder.first_order(&shifted_batch).unwrap();

        let age_weight = embedder.slots[3].first_order.weights().data()[0];
        let delta = shifted.data()[0] - base.data()[0];
        assert!((delta - age_weight).abs() < 1e-5);
        assert!((shifted.data()[1] - base.data()[1]).abs() < 1e-6);
    }

    #[test]
    fn test_sequence_too_long() {
        let embedder = embedder();
        let bad = batch().with_token_seqs("history", vec![vec![0, 1, 2, 3, 4], vec![]]);
        assert!(matches!(
            embedder.embed_fields(&bad),
            Err(ModelError::SequenceTooLong { .. })
        ));
    }

    #[test]
    fn test_column_length_mismatch() {
        let embedder = embedder();
        let bad = batch().with_tokens("user", vec![1]);
        assert!(matches!(
            embedder.embed_fields(&bad),
            Err(ModelError::ColumnLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_column() {
        let embedder = embedder();
        let bad = MiniBatch::new().with_tokens("user", vec![1]);
        assert!(embedder.embed_fields(&bad).is_err());
    }

    #[test]
    fn test_same_seed_same_parameters() {
        let a = ContextEmbedder::new(&schema(), 6, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = ContextEmbedder::new(&schema(), 6, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(
            a.embed_fields(&batch()).unwrap(),
            b.embed_fields(&batch()).unwrap()
        );
        assert_eq!(
            a.first_order(&batch()).unwrap(),
            b.first_order(&batch()).unwrap()
        );
    }

    #[test]
    fn test_parameters_mut_count() {
        let mut embedder = embedder();
        // 3 embedding tables + 4 first-order tables + bias.
        assert_eq!(embedder.parameters_mut().len(), 8);
    }
}
