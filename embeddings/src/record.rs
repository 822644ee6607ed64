//! Stored vector records and the inputs that create them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::registry::{is_supported_dimension, model_for_dimensions, model_info};
use crate::similarity::first_non_finite;

/// Namespace used when the caller does not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

const MAX_NAMESPACE_LENGTH: usize = 64;
const MAX_VECTOR_ID_LENGTH: usize = 256;

/// Free-form metadata attached to a vector.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A vector stored in a namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Identifier, unique within the namespace.
    pub vector_id: String,

    /// Partition this record lives in.
    pub namespace: String,

    /// The stored vector.
    pub embedding: Embedding,

    /// Source text the vector was computed from.
    pub document: String,

    /// Model that produced the vector.
    pub model: String,

    /// Always `embedding.len()`.
    pub dimensions: usize,

    /// Metadata, matched by equality at query time.
    pub metadata: Metadata,

    pub stored_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`crate::VectorStore::upsert`] and
/// [`crate::VectorStore::insert_if_absent`].
#[derive(Debug, Clone, Default)]
pub struct UpsertRequest {
    pub namespace: Option<String>,
    pub vector_id: Option<String>,
    pub embedding: Embedding,
    pub document: String,
    pub model: Option<String>,
    pub metadata: Option<Metadata>,
}

impl UpsertRequest {
    /// Create a request for `embedding` with its source `document`.
    pub fn new(embedding: Embedding, document: impl Into<String>) -> Self {
        Self {
            embedding,
            document: document.into(),
            ..Self::default()
        }
    }

    /// Target a namespace other than [`DEFAULT_NAMESPACE`].
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Use an explicit id instead of a generated one.
    pub fn with_vector_id(mut self, vector_id: impl Into<String>) -> Self {
        self.vector_id = Some(vector_id.into());
        self
    }

    /// Assert which model produced the embedding.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A request that passed validation; only the id may still be missing.
#[derive(Debug)]
pub(crate) struct ValidatedUpsert {
    pub namespace: String,
    pub vector_id: Option<String>,
    pub embedding: Embedding,
    pub document: String,
    pub model: String,
    pub metadata: Metadata,
}

impl ValidatedUpsert {
    /// Build the record to persist, stamped with `now`.
    pub fn into_record(self, vector_id: String, now: DateTime<Utc>) -> VectorRecord {
        let dimensions = self.embedding.len();
        VectorRecord {
            vector_id,
            namespace: self.namespace,
            embedding: self.embedding,
            document: self.document,
            model: self.model,
            dimensions,
            metadata: self.metadata,
            stored_at: now,
            updated_at: now,
        }
    }
}

impl UpsertRequest {
    /// Check self-consistency before anything is written.
    pub(crate) fn validate(self) -> Result<ValidatedUpsert> {
        let namespace = resolve_namespace(self.namespace.as_deref())?;
        let vector_id = self.vector_id.map(validate_vector_id).transpose()?;

        if self.document.trim().is_empty() {
            return Err(EmbeddingError::EmptyDocument);
        }

        let actual = self.embedding.len();
        let model = match self.model.as_deref() {
            Some(name) => {
                let info = model_info(name)?;
                if actual != info.dimensions {
                    return Err(EmbeddingError::DimensionMismatch {
                        actual,
                        expected: Some(info.dimensions),
                        model: Some(info.name.to_string()),
                    });
                }
                info.name
            }
            None => match model_for_dimensions(actual) {
                Some(info) if is_supported_dimension(actual) => info.name,
                _ => {
                    return Err(EmbeddingError::DimensionMismatch {
                        actual,
                        expected: None,
                        model: None,
                    });
                }
            },
        };

        if let Some(index) = first_non_finite(&self.embedding) {
            return Err(EmbeddingError::NonFiniteComponent { index });
        }

        Ok(ValidatedUpsert {
            namespace,
            vector_id,
            embedding: self.embedding,
            document: self.document,
            model: model.to_string(),
            metadata: self.metadata.unwrap_or_default(),
        })
    }
}

/// Validate a namespace, defaulting to [`DEFAULT_NAMESPACE`].
pub fn resolve_namespace(namespace: Option<&str>) -> Result<String> {
    let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);
    let valid = !namespace.is_empty()
        && namespace.len() <= MAX_NAMESPACE_LENGTH
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(namespace.to_string())
    } else {
        Err(EmbeddingError::InvalidNamespace {
            namespace: namespace.to_string(),
        })
    }
}

fn validate_vector_id(vector_id: String) -> Result<String> {
    if vector_id.trim().is_empty() || vector_id.chars().count() > MAX_VECTOR_ID_LENGTH {
        return Err(EmbeddingError::InvalidVectorId { vector_id });
    }
    Ok(vector_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DEFAULT_MODEL;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_namespace_rules() {
        assert_eq!(resolve_namespace(None).unwrap(), "default");
        assert_eq!(resolve_namespace(Some("agent_7-prod")).unwrap(), "agent_7-prod");
        assert!(resolve_namespace(Some("")).is_err());
        assert!(resolve_namespace(Some("has space")).is_err());
        assert!(resolve_namespace(Some("dots.not.allowed")).is_err());
        assert!(resolve_namespace(Some(&"x".repeat(65))).is_err());
    }

    #[test]
    fn test_raw_vector_infers_model() {
        let validated = UpsertRequest::new(vec![0.1; 384], "doc").validate().unwrap();
        assert_eq!(validated.model, DEFAULT_MODEL);
        assert_eq!(validated.namespace, "default");
    }

    #[test]
    fn test_unsupported_width_rejected() {
        let err = UpsertRequest::new(vec![0.1; 512], "doc").validate().unwrap_err();
        let detail = err.to_string();
        assert!(detail.contains("512"));
        assert!(detail.contains("384, 768, 1024, 1536"));
    }

    #[test]
    fn test_model_width_enforced() {
        let err = UpsertRequest::new(vec![0.1; 384], "doc")
            .with_model("sentence-transformers/all-mpnet-base-v2")
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                actual: 384,
                expected: Some(768),
                ..
            }
        ));
    }

    #[test]
    fn test_blank_document_and_id_rejected() {
        assert!(matches!(
            UpsertRequest::new(vec![0.1; 384], "  ").validate(),
            Err(EmbeddingError::EmptyDocument)
        ));
        assert!(matches!(
            UpsertRequest::new(vec![0.1; 384], "doc")
                .with_vector_id(" ")
                .validate(),
            Err(EmbeddingError::InvalidVectorId { .. })
        ));
    }

    #[test]
    fn test_non_finite_components_rejected() {
        let mut embedding = vec![0.1; 384];
        embedding[7] = f32::INFINITY;
        assert!(matches!(
            UpsertRequest::new(embedding, "doc").validate(),
            Err(EmbeddingError::NonFiniteComponent { index: 7 })
        ));

        let mut embedding = vec![0.1; 384];
        embedding[0] = f32::NAN;
        assert!(matches!(
            UpsertRequest::new(embedding, "doc").validate(),
            Err(EmbeddingError::NonFiniteComponent { index: 0 })
        ));
    }
}
