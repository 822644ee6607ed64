//! Request and response bodies shared by several routes.

use agent402_embeddings::{Embedding, Metadata, UpsertOutcome, VectorRecord};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub(crate) fn default_true() -> bool {
    true
}

/// Milliseconds elapsed since `start`.
pub(crate) fn elapsed_ms(start: std::time::Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Reply to a store call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreResponse {
    pub vector_id: String,
    pub created: bool,
    pub dimensions: usize,
    pub model: String,
    pub namespace: String,
    pub metadata: Metadata,
    pub stored_at: DateTime<Utc>,
    pub processing_time_ms: f64,
}

impl StoreResponse {
    pub fn new(outcome: UpsertOutcome, processing_time_ms: f64) -> Self {
        let UpsertOutcome { record, created } = outcome;
        Self {
            vector_id: record.vector_id,
            created,
            dimensions: record.dimensions,
            model: record.model,
            namespace: record.namespace,
            metadata: record.metadata,
            stored_at: record.updated_at,
            processing_time_ms,
        }
    }
}

impl IntoResponse for StoreResponse {
    fn into_response(self) -> Response {
        let status = if self.created {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        };
        (status, Json(self)).into_response()
    }
}

/// A stored vector as returned by get and list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorView {
    pub vector_id: String,
    pub namespace: String,
    pub document: String,
    pub model: String,
    pub dimensions: usize,
    pub metadata: Metadata,
    pub stored_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Embedding>,
}

impl VectorView {
    pub fn new(record: VectorRecord, include_embedding: bool) -> Self {
        Self {
            vector_id: record.vector_id,
            namespace: record.namespace,
            document: record.document,
            model: record.model,
            dimensions: record.dimensions,
            metadata: record.metadata,
            stored_at: record.stored_at,
            updated_at: record.updated_at,
            embedding: include_embedding.then_some(record.embedding),
        }
    }
}

/// Query string carrying only a namespace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamespaceQuery {
    pub namespace: Option<String>,
}
