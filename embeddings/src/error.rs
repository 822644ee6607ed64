//! Error types for the embeddings system.

use serde::Serialize;
use thiserror::Error;

use crate::registry::SUPPORTED_DIMENSIONS;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Coarse classification of an error, used by callers to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The referenced vector does not exist.
    NotFound,
    /// The input was rejected before any work was done.
    Validation,
    /// The write collides with existing state.
    Conflict,
    /// An upstream provider is throttling requests.
    Unavailable,
    /// Anything else.
    Internal,
}

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Text to embed was empty or whitespace only.
    #[error("text must not be empty or whitespace only")]
    EmptyInput,

    /// Text too long for embedding.
    #[error("text too long: {length} characters, max {max_length}")]
    TextTooLong { length: usize, max_length: usize },

    /// Model is not in the dimension registry.
    #[error("model '{model}' is not supported; see /v1/public/embeddings/models for the supported list")]
    ModelNotFound { model: String },

    /// Embedding length is not a supported width, or not the width of the
    /// asserted model.
    #[error("{}", dimension_mismatch_detail(*actual, *expected, model.as_deref()))]
    DimensionMismatch {
        actual: usize,
        expected: Option<usize>,
        model: Option<String>,
    },

    /// Embedding holds a NaN or infinite component.
    #[error("embedding component {index} is not a finite number")]
    NonFiniteComponent { index: usize },

    /// Namespace contains characters outside `[A-Za-z0-9_-]` or has a bad length.
    #[error(
        "invalid namespace '{namespace}': use 1-64 characters from letters, digits, underscore and hyphen"
    )]
    InvalidNamespace { namespace: String },

    /// Vector id is blank or too long.
    #[error("invalid vector_id '{vector_id}': must be 1-256 non-blank characters")]
    InvalidVectorId { vector_id: String },

    /// Document text was empty or whitespace only.
    #[error("document must not be empty or whitespace only")]
    EmptyDocument,

    /// `top_k` outside the accepted range.
    #[error("top_k must be between 1 and {max}, got {top_k}")]
    InvalidTopK { top_k: i64, max: usize },

    /// Similarity threshold outside `[0.0, 1.0]`.
    #[error("similarity_threshold must be between 0.0 and 1.0, got {threshold}")]
    InvalidThreshold { threshold: f32 },

    /// Pagination parameters outside the accepted range.
    #[error("limit must be between 1 and {max_limit}, got {limit}")]
    InvalidPagination { limit: usize, max_limit: usize },

    /// Malformed search request.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Strict insert hit an existing id.
    #[error("vector '{vector_id}' already exists in namespace '{namespace}'; set upsert=true to overwrite it")]
    VectorAlreadyExists {
        vector_id: String,
        namespace: String,
    },

    /// No vector with this id in the namespace.
    #[error("vector '{vector_id}' not found in namespace '{namespace}'")]
    VectorNotFound {
        vector_id: String,
        namespace: String,
    },

    /// Provider not configured.
    #[error("embedding provider not configured")]
    ProviderNotConfigured,

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl EmbeddingError {
    /// Stable machine-readable code. Callers pattern-match on these, so they
    /// must never change once released.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::TextTooLong { .. } => "TEXT_TOO_LONG",
            Self::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::NonFiniteComponent { .. } => "INVALID_EMBEDDING",
            Self::InvalidNamespace { .. } => "INVALID_NAMESPACE",
            Self::InvalidVectorId { .. } => "INVALID_VECTOR_ID",
            Self::EmptyDocument => "EMPTY_DOCUMENT",
            Self::InvalidTopK { .. } => "INVALID_TOP_K",
            Self::InvalidThreshold { .. } => "INVALID_THRESHOLD",
            Self::InvalidPagination { .. } => "INVALID_PAGINATION",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::VectorAlreadyExists { .. } => "VECTOR_ALREADY_EXISTS",
            Self::VectorNotFound { .. } => "VECTOR_NOT_FOUND",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::ProviderNotConfigured
            | Self::ApiRequest(_)
            | Self::InvalidResponse(_)
            | Self::Serialization(_)
            | Self::Http(_) => "EMBEDDING_PROVIDER_ERROR",
        }
    }

    /// Status classification for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::VectorNotFound { .. } => ErrorKind::NotFound,
            Self::VectorAlreadyExists { .. } => ErrorKind::Conflict,
            Self::RateLimited { .. } => ErrorKind::Unavailable,
            Self::ProviderNotConfigured
            | Self::ApiRequest(_)
            | Self::InvalidResponse(_)
            | Self::Serialization(_)
            | Self::Http(_) => ErrorKind::Internal,
            Self::EmptyInput
            | Self::TextTooLong { .. }
            | Self::ModelNotFound { .. }
            | Self::DimensionMismatch { .. }
            | Self::NonFiniteComponent { .. }
            | Self::InvalidNamespace { .. }
            | Self::InvalidVectorId { .. }
            | Self::EmptyDocument
            | Self::InvalidTopK { .. }
            | Self::InvalidThreshold { .. }
            | Self::InvalidPagination { .. }
            | Self::InvalidQuery(_) => ErrorKind::Validation,
        }
    }
}

fn dimension_mismatch_detail(actual: usize, expected: Option<usize>, model: Option<&str>) -> String {
    let supported = SUPPORTED_DIMENSIONS
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    match (expected, model) {
        (Some(expected), Some(model)) => format!(
            "dimension mismatch: embedding has {actual} dimensions but model '{model}' expects {expected}; supported dimensions are [{supported}]"
        ),
        (Some(expected), None) => format!(
            "dimension mismatch: embedding has {actual} dimensions but {expected} were expected; supported dimensions are [{supported}]"
        ),
        (None, _) => format!(
            "dimension mismatch: embedding has {actual} dimensions; supported dimensions are [{supported}]"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dimension_mismatch_names_actual_and_supported() {
        let err = EmbeddingError::DimensionMismatch {
            actual: 512,
            expected: None,
            model: None,
        };
        let detail = err.to_string();
        assert!(detail.contains("512"));
        assert!(detail.contains("384, 768, 1024, 1536"));
        assert_eq!(err.error_code(), "DIMENSION_MISMATCH");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_dimension_mismatch_names_model_width() {
        let err = EmbeddingError::DimensionMismatch {
            actual: 384,
            expected: Some(768),
            model: Some("sentence-transformers/all-mpnet-base-v2".to_string()),
        };
        let detail = err.to_string();
        assert!(detail.contains("all-mpnet-base-v2"));
        assert!(detail.contains("expects 768"));
    }

    #[test]
    fn test_error_kinds() {
        let not_found = EmbeddingError::VectorNotFound {
            vector_id: "v1".to_string(),
            namespace: "default".to_string(),
        };
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert!(not_found.to_string().contains("v1"));

        let conflict = EmbeddingError::VectorAlreadyExists {
            vector_id: "v1".to_string(),
            namespace: "default".to_string(),
        };
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert_eq!(conflict.error_code(), "VECTOR_ALREADY_EXISTS");

        assert_eq!(EmbeddingError::EmptyInput.kind(), ErrorKind::Validation);
        let non_finite = EmbeddingError::NonFiniteComponent { index: 2 };
        assert_eq!(non_finite.kind(), ErrorKind::Validation);
        assert_eq!(non_finite.error_code(), "INVALID_EMBEDDING");
        assert_eq!(
            EmbeddingError::RateLimited {
                retry_after_secs: 3
            }
            .kind(),
            ErrorKind::Unavailable
        );
    }
}
