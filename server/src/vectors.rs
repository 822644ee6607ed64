//! Raw vector routes under `/database`.

use std::time::Instant;

use agent402_embeddings::record::resolve_namespace;
use agent402_embeddings::{
    DEFAULT_NAMESPACE, Embedding, EmbeddingError, Metadata, NamespaceStats, UpsertRequest,
};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::{NamespaceQuery, StoreResponse, VectorView, default_true, elapsed_ms};

#[derive(Debug, Clone, Deserialize)]
pub struct VectorUpsertRequest {
    pub vector_embedding: Embedding,
    pub document: String,
    pub vector_id: Option<String>,
    pub model: Option<String>,
    pub namespace: Option<String>,
    pub metadata: Option<Metadata>,

    /// `false` turns the write into a strict insert.
    #[serde(default = "default_true")]
    pub upsert: bool,
}

/// `POST /v1/public/{project_id}/database/vectors/upsert`
pub async fn upsert_vector(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<VectorUpsertRequest>, JsonRejection>,
) -> ApiResult<StoreResponse> {
    let Path(project_id) = path?;
    let Json(request) = payload?;
    let start = Instant::now();
    let store = state.projects.get_or_create(&project_id).await?;

    let upsert = UpsertRequest {
        namespace: request.namespace,
        vector_id: request.vector_id,
        embedding: request.vector_embedding,
        document: request.document,
        model: request.model,
        metadata: request.metadata,
    };
    let outcome = if request.upsert {
        store.upsert(upsert).await?
    } else {
        store.insert_if_absent(upsert).await?
    };

    info!(
        "Stored vector {} for project {project_id} (created: {})",
        outcome.record.vector_id, outcome.created
    );
    Ok(StoreResponse::new(outcome, elapsed_ms(start)))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub namespace: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub vectors: Vec<VectorView>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub namespace: String,
}

/// `GET /v1/public/{project_id}/database/vectors`
pub async fn list_vectors(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<ListResponse>> {
    let Path(project_id) = path?;
    let Query(query) = query?;
    let namespace = resolve_namespace(query.namespace.as_deref())?;
    let store_config = &state.config.store;
    let limit = query.limit.unwrap_or(store_config.default_list_limit);
    if limit == 0 || limit > store_config.max_list_limit {
        return Err(EmbeddingError::InvalidPagination {
            limit,
            max_limit: store_config.max_list_limit,
        }
        .into());
    }
    let offset = query.offset.unwrap_or(0);

    let store = state.projects.get_or_empty(&project_id).await?;
    let page = store.list(&namespace, limit, offset).await?;

    Ok(Json(ListResponse {
        vectors: page
            .records
            .into_iter()
            .map(|record| VectorView::new(record, false))
            .collect(),
        total: page.total,
        limit,
        offset,
        namespace,
    }))
}

/// `GET /v1/public/{project_id}/database/vectors/{vector_id}`
pub async fn get_vector(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
    query: Result<Query<NamespaceQuery>, QueryRejection>,
) -> ApiResult<Json<VectorView>> {
    let Path((project_id, vector_id)) = path?;
    let Query(query) = query?;
    let namespace = query.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
    let store = state.projects.get_or_empty(&project_id).await?;
    let record = store.get(namespace, &vector_id).await?;
    Ok(Json(VectorView::new(record, true)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub vector_id: String,
    pub namespace: String,
    pub deleted: bool,
}

/// `DELETE /v1/public/{project_id}/database/vectors/{vector_id}`
pub async fn delete_vector(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
    query: Result<Query<NamespaceQuery>, QueryRejection>,
) -> ApiResult<Json<DeleteResponse>> {
    let Path((project_id, vector_id)) = path?;
    let Query(query) = query?;
    let namespace = resolve_namespace(query.namespace.as_deref())?;
    let store = state.projects.get_or_empty(&project_id).await?;
    if !store.delete(&namespace, &vector_id).await? {
        return Err(EmbeddingError::VectorNotFound {
            vector_id,
            namespace,
        }
        .into());
    }

    info!("Deleted vector {vector_id} from {project_id}/{namespace}");
    Ok(Json(DeleteResponse {
        vector_id,
        namespace,
        deleted: true,
    }))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespacesResponse {
    pub namespaces: Vec<NamespaceStats>,
    pub total_vectors: usize,
}

/// `GET /v1/public/{project_id}/database/namespaces`
pub async fn list_namespaces(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<NamespacesResponse>> {
    let Path(project_id) = path?;
    let store = state.projects.get_or_empty(&project_id).await?;
    let namespaces = store.stats().await;
    let total_vectors = namespaces.iter().map(|ns| ns.vector_count).sum();
    Ok(Json(NamespacesResponse {
        namespaces,
        total_vectors,
    }))
}
