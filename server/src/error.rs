//! HTTP error envelope.
//!
//! Every failure leaves the server as `{"detail": ..., "error_code": ...}`
//! with a status derived from the error's kind.

use agent402_embeddings::{EmbeddingError, ErrorKind};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Result type alias for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors surfaced to API callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Error from the embeddings core.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Project id in the path is malformed.
    #[error(
        "invalid project_id '{0}': use 1-128 characters from letters, digits, underscore and hyphen"
    )]
    InvalidProjectId(String),

    /// Request body or query string could not be decoded.
    #[error("{0}")]
    InvalidRequest(String),
}

/// Wire shape of an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    pub error_code: String,
}

impl ApiError {
    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Embedding(err) => err.error_code(),
            Self::InvalidProjectId(_) => "INVALID_PROJECT_ID",
            Self::InvalidRequest(_) => "VALIDATION_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// - Not found: 404
    /// - Validation: 422
    /// - Conflict: 409
    /// - Upstream throttling: 503
    /// - Internal: 500
    pub fn status_code(&self) -> StatusCode {
        let kind = match self {
            Self::Embedding(err) => err.kind(),
            Self::InvalidProjectId(_) | Self::InvalidRequest(_) => ErrorKind::Validation,
        };
        match kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Provider failures can carry upstream bodies; keep them in the logs.
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!("Embedding provider failure: {self}");
            "embedding provider request failed".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            detail,
            error_code: self.error_code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_status_codes() {
        let not_found = ApiError::from(EmbeddingError::VectorNotFound {
            vector_id: "v".to_string(),
            namespace: "default".to_string(),
        });
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let conflict = ApiError::from(EmbeddingError::VectorAlreadyExists {
            vector_id: "v".to_string(),
            namespace: "default".to_string(),
        });
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        assert_eq!(
            ApiError::from(EmbeddingError::EmptyInput).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::InvalidProjectId("bad id".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(EmbeddingError::ProviderNotConfigured).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes_pass_through() {
        let err = ApiError::from(EmbeddingError::ModelNotFound {
            model: "x".to_string(),
        });
        assert_eq!(err.error_code(), "MODEL_NOT_FOUND");
        assert_eq!(
            ApiError::InvalidRequest("bad".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak_details() {
        let err = ApiError::from(EmbeddingError::ApiRequest(
            "401: secret upstream body".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error_code, "EMBEDDING_PROVIDER_ERROR");
        assert!(!body.detail.contains("secret"));
    }
}
