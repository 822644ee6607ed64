//! Shared handler state.

use std::collections::HashMap;
use std::sync::Arc;

use agent402_embeddings::{EmbeddingProvider, VectorStore};
use tokio::sync::RwLock;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};

const MAX_PROJECT_ID_LENGTH: usize = 128;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// One vector store per project.
    pub projects: Arc<ProjectRegistry>,

    /// Embedding provider used for text inputs.
    pub provider: Arc<dyn EmbeddingProvider>,

    /// Limits and defaults.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create state with a fresh project registry.
    pub fn new(config: ServerConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            projects: Arc::new(ProjectRegistry::new()),
            provider,
            config: Arc::new(config),
        }
    }
}

/// Vector stores keyed by project id. Projects never share vectors.
#[derive(Default)]
pub struct ProjectRegistry {
    stores: RwLock<HashMap<String, Arc<VectorStore>>>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store for `project_id`, created on first write.
    pub async fn get_or_create(&self, project_id: &str) -> ApiResult<Arc<VectorStore>> {
        validate_project_id(project_id)?;
        if let Some(store) = self.stores.read().await.get(project_id) {
            return Ok(Arc::clone(store));
        }
        let mut stores = self.stores.write().await;
        let store = stores.entry(project_id.to_string()).or_insert_with(|| {
            info!("Created vector store for project {project_id}");
            Arc::new(VectorStore::new())
        });
        Ok(Arc::clone(store))
    }

    /// Store for `project_id`, or an empty one if the project never wrote.
    ///
    /// Reads do not register projects.
    pub async fn get_or_empty(&self, project_id: &str) -> ApiResult<Arc<VectorStore>> {
        validate_project_id(project_id)?;
        Ok(self
            .stores
            .read()
            .await
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Number of projects holding a store.
    pub async fn len(&self) -> usize {
        self.stores.read().await.len()
    }

    /// Check if no project has written yet.
    pub async fn is_empty(&self) -> bool {
        self.stores.read().await.is_empty()
    }
}

pub(crate) fn validate_project_id(project_id: &str) -> ApiResult<()> {
    let valid = !project_id.is_empty()
        && project_id.len() <= MAX_PROJECT_ID_LENGTH
        && project_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ApiError::InvalidProjectId(project_id.to_string()))
    }
}
