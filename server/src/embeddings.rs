//! Text-based routes: generate, embed-and-store, search.

use std::time::Instant;

use agent402_embeddings::registry::{model_for_dimensions, model_info};
use agent402_embeddings::search::validate_top_k;
use agent402_embeddings::{
    Embedding, EmbeddingError, EmbeddingRequest, Metadata, SearchHit, SearchOptions,
    UpsertRequest, record::resolve_namespace,
};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::{AppState, validate_project_id};
use crate::types::{StoreResponse, default_true, elapsed_ms};

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub embedding: Embedding,
    pub model: String,
    pub dimensions: usize,
    pub text: String,
    pub processing_time_ms: f64,
}

/// `POST /v1/public/{project_id}/embeddings/generate`
pub async fn generate(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let Path(project_id) = path?;
    validate_project_id(&project_id)?;
    let Json(request) = payload?;
    let start = Instant::now();

    let mut embed = EmbeddingRequest::new(request.text.clone());
    embed.model = request.model;
    let response = state.provider.embed(embed).await?;

    Ok(Json(GenerateResponse {
        embedding: response.embedding,
        model: response.model,
        dimensions: response.dimensions,
        text: request.text,
        processing_time_ms: elapsed_ms(start),
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbedAndStoreRequest {
    pub text: String,
    pub vector_id: Option<String>,
    pub model: Option<String>,
    pub namespace: Option<String>,
    pub metadata: Option<Metadata>,

    /// `false` turns the write into a strict insert.
    #[serde(default = "default_true")]
    pub upsert: bool,
}

/// `POST /v1/public/{project_id}/embeddings/embed-and-store`
pub async fn embed_and_store(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<EmbedAndStoreRequest>, JsonRejection>,
) -> ApiResult<StoreResponse> {
    let Path(project_id) = path?;
    let Json(request) = payload?;
    let start = Instant::now();
    let store = state.projects.get_or_create(&project_id).await?;

    let mut embed = EmbeddingRequest::new(request.text.clone());
    embed.model = request.model;
    let generated = state.provider.embed(embed).await?;

    let upsert = UpsertRequest {
        namespace: request.namespace,
        vector_id: request.vector_id,
        embedding: generated.embedding,
        document: request.text,
        model: Some(generated.model),
        metadata: request.metadata,
    };
    let outcome = if request.upsert {
        store.upsert(upsert).await?
    } else {
        store.insert_if_absent(upsert).await?
    };

    info!(
        "Embedded and stored {} for project {project_id} (created: {})",
        outcome.record.vector_id, outcome.created
    );
    Ok(StoreResponse::new(outcome, elapsed_ms(start)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    /// Text to embed and search with.
    pub query: Option<String>,

    /// Raw vector to search with.
    pub query_vector: Option<Embedding>,

    pub model: Option<String>,
    pub namespace: Option<String>,
    pub top_k: Option<i64>,
    pub similarity_threshold: Option<f32>,
    pub metadata_filter: Option<Metadata>,

    #[serde(default = "default_true")]
    pub include_metadata: bool,

    #[serde(default)]
    pub include_embeddings: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total_results: usize,
    pub namespace: String,
    pub model: Option<String>,
    pub dimensions: usize,
    pub processing_time_ms: f64,
}

/// `POST /v1/public/{project_id}/embeddings/search`
pub async fn search(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Path(project_id) = path?;
    let Json(request) = payload?;
    let start = Instant::now();

    let namespace = resolve_namespace(request.namespace.as_deref())?;
    let search_config = &state.config.search;
    let default_top_k = i64::try_from(search_config.default_top_k).unwrap_or(i64::MAX);
    let top_k = validate_top_k(
        request.top_k.unwrap_or(default_top_k),
        search_config.max_top_k,
    )?;
    let mut options = SearchOptions::default()
        .with_top_k(top_k)
        .with_max_top_k(search_config.max_top_k)
        .with_threshold(request.similarity_threshold.unwrap_or(0.0))
        .with_include_metadata(request.include_metadata)
        .with_include_embeddings(request.include_embeddings);
    if let Some(filter) = request.metadata_filter {
        options = options.with_metadata_filter(filter);
    }
    options.validate()?;

    let (query, model) = match (request.query, request.query_vector) {
        (Some(text), None) => {
            let mut embed = EmbeddingRequest::new(text);
            embed.model = request.model;
            let generated = state.provider.embed(embed).await?;
            (generated.embedding, Some(generated.model))
        }
        (None, Some(vector)) => {
            let model = query_vector_model(&vector, request.model.as_deref())?;
            (vector, model)
        }
        (Some(_), Some(_)) => {
            return Err(EmbeddingError::InvalidQuery(
                "provide either query or query_vector, not both".to_string(),
            )
            .into());
        }
        (None, None) => {
            return Err(EmbeddingError::InvalidQuery(
                "one of query or query_vector is required".to_string(),
            )
            .into());
        }
    };

    let store = state.projects.get_or_empty(&project_id).await?;
    let outcome = store.search(&namespace, &query, &options).await?;
    debug!(
        "Search in {project_id}/{namespace}: {} hits, {} compared, {} skipped",
        outcome.hits.len(),
        outcome.searched,
        outcome.skipped
    );

    Ok(Json(SearchResponse {
        total_results: outcome.hits.len(),
        results: outcome.hits,
        namespace,
        model,
        dimensions: query.len(),
        processing_time_ms: elapsed_ms(start),
    }))
}

/// Check a raw query vector against the asserted model, or infer one.
fn query_vector_model(vector: &[f32], model: Option<&str>) -> ApiResult<Option<String>> {
    match model {
        Some(name) => {
            let info = model_info(name)?;
            if vector.len() != info.dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    actual: vector.len(),
                    expected: Some(info.dimensions),
                    model: Some(info.name.to_string()),
                }
                .into());
            }
            Ok(Some(info.name.to_string()))
        }
        None => Ok(model_for_dimensions(vector.len()).map(|info| info.name.to_string())),
    }
}
