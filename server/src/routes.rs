//! Router assembly plus the project-independent routes.

use agent402_embeddings::ModelInfo;
use agent402_embeddings::registry::{DEFAULT_MODEL, models};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{embeddings, vectors};

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/public/embeddings/models", get(list_models))
        .route(
            "/v1/public/{project_id}/embeddings/generate",
            post(embeddings::generate),
        )
        .route(
            "/v1/public/{project_id}/embeddings/embed-and-store",
            post(embeddings::embed_and_store),
        )
        .route(
            "/v1/public/{project_id}/embeddings/search",
            post(embeddings::search),
        )
        .route(
            "/v1/public/{project_id}/database/vectors/upsert",
            post(vectors::upsert_vector),
        )
        .route(
            "/v1/public/{project_id}/database/vectors",
            get(vectors::list_vectors),
        )
        .route(
            "/v1/public/{project_id}/database/vectors/{vector_id}",
            get(vectors::get_vector).delete(vectors::delete_vector),
        )
        .route(
            "/v1/public/{project_id}/database/namespaces",
            get(vectors::list_namespaces),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    projects: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        projects: state.projects.len().await,
    })
}

#[derive(Debug, Serialize)]
struct ModelView {
    #[serde(flatten)]
    info: ModelInfo,
    is_default: bool,
}

#[derive(Debug, Serialize)]
struct ModelsResponse {
    models: Vec<ModelView>,
    default_model: &'static str,
    total: usize,
}

async fn list_models() -> Json<ModelsResponse> {
    let models: Vec<ModelView> = models()
        .iter()
        .map(|info| ModelView {
            info: *info,
            is_default: info.is_default(),
        })
        .collect();
    Json(ModelsResponse {
        total: models.len(),
        models,
        default_model: DEFAULT_MODEL,
    })
}
