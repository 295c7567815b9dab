//! Dataset schema: the fixed set of input fields a model is built for.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// The kind of values a feature field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// A single categorical id per row.
    Token {
        /// Number of distinct ids
        vocab_size: usize,
    },
    /// A variable-length list of categorical ids per row, pooled to one
    /// vector by mean pooling.
    TokenSeq {
        /// Number of distinct ids
        vocab_size: usize,
        /// Maximum sequence length accepted per row
        max_len: usize,
    },
    /// A numeric value per row. Embedded floats own a learned vector scaled
    /// by the value and participate in pairwise interactions; plain floats
    /// contribute to the first-order term only.
    Float {
        /// Whether the field owns an embedding vector
        embedded: bool,
    },
}

/// One named input column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureField {
    name: String,
    kind: FieldKind,
}

impl FeatureField {
    /// Creates a categorical field.
    pub fn token(name: impl Into<String>, vocab_size: usize) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Token { vocab_size },
        }
    }

    /// Creates a categorical sequence field.
    pub fn token_seq(name: impl Into<String>, vocab_size: usize, max_len: usize) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::TokenSeq {
                vocab_size,
                max_len,
            },
        }
    }

    /// Creates a numeric field that only feeds the first-order term.
    pub fn float(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Float { embedded: false },
        }
    }

    /// Creates a numeric field with a learned embedding vector.
    pub fn embedded_float(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Float { embedded: true },
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns whether the field participates in pairwise interactions.
    pub fn is_interacting(&self) -> bool {
        !matches!(self.kind, FieldKind::Float { embedded: false })
    }

    fn validate(&self) -> ModelResult<()> {
        if self.name.is_empty() {
            return Err(ModelError::Config {
                message: "Field name must not be empty".to_string(),
            });
        }
        match self.kind {
            FieldKind::Token { vocab_size } => {
                if vocab_size == 0 {
                    return Err(ModelError::Config {
                        message: format!("Field '{}' has an empty vocabulary", self.name),
                    });
                }
            }
            FieldKind::TokenSeq {
                vocab_size,
                max_len,
            } => {
                if vocab_size == 0 {
                    return Err(ModelError::Config {
                        message: format!("Field '{}' has an empty vocabulary", self.name),
                    });
                }
                if max_len == 0 {
                    return Err(ModelError::Config {
                        message: format!("Field '{}' has a zero maximum length", self.name),
                    });
                }
            }
            FieldKind::Float { .. } => {}
        }
        Ok(())
    }
}

/// The ordered set of input fields a model is constructed against.
///
/// Field order defines embedding-slot order and is immutable once the model
/// is built.
///
/// # Example
///
/// ```
/// use afm_model::schema::{DatasetSchema, FeatureField};
///
/// let schema = DatasetSchema::new()
///     .with_field(FeatureField::token("user_id", 1000))
///     .with_field(FeatureField::token("item_id", 5000))
///     .with_field(FeatureField::float("age"));
/// assert_eq!(schema.num_fields(), 3);
/// assert_eq!(schema.num_interacting_fields(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    fields: Vec<FeatureField>,
}

impl DatasetSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Appends a field, preserving insertion order.
    pub fn with_field(mut self, field: FeatureField) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the fields in slot order.
    pub fn fields(&self) -> &[FeatureField] {
        &self.fields
    }

    /// Returns the total number of fields.
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Returns the number of fields that join pairwise interactions.
    pub fn num_interacting_fields(&self) -> usize {
        self.fields.iter().filter(|f| f.is_interacting()).count()
    }

    /// Validates the schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty schema, duplicate field
    /// names, or an invalid individual field.
    pub fn validate(&self) -> ModelResult<()> {
        if self.fields.is_empty() {
            return Err(ModelError::Config {
                message: "Schema must declare at least one field".to_string(),
            });
        }
        for field in &self.fields {
            field.validate()?;
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name() == field.name()) {
                return Err(ModelError::Config {
                    message: format!("Duplicate field name '{}'", field.name()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_constructors() {
        let f = FeatureField::token("user_id", 100);
        assert_eq!(f.name(), "user_id");
        assert!(f.is_interacting());

        let f = FeatureField::token_seq("history", 100, 20);
        assert!(f.is_interacting());

        let f = FeatureField::embedded_float("price");
        assert!(f.is_interacting());

        let f = FeatureField::float("age");
        assert!(!f.is_interacting());
    }

    #[test]
    fn test_schema_counts() {
        let schema = DatasetSchema::new()
            .with_field(FeatureField::token("a", 10))
            .with_field(FeatureField::float("b"))
            .with_field(FeatureField::embedded_float("c"));
        assert_eq!(schema.num_fields(), 3);
        assert_eq!(schema.num_interacting_fields(), 2);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_schema_rejects_empty() {
        assert!(DatasetSchema::new().validate().is_err());
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let schema = DatasetSchema::new()
            .with_field(FeatureField::token("a", 10))
            .with_field(FeatureField::float("a"));
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_schema_rejects_bad_fields() {
        let schema = DatasetSchema::new().with_field(FeatureField::token("a", 0));
        assert!(schema.validate().is_err());

        let schema = DatasetSchema::new().with_field(FeatureField::token_seq("s", 10, 0));
        assert!(schema.validate().is_err());

        let schema = DatasetSchema::new().with_field(FeatureField::token("", 10));
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_schema_serde_round_trip() {
        let schema = DatasetSchema::new()
            .with_field(FeatureField::token("a", 10))
            .with_field(FeatureField::token_seq("s", 10, 5));
        let json = serde_json::to_string(&schema).unwrap();
        let back: DatasetSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, back);
    }
}
