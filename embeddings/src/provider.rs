//! Embedding providers.
//!
//! The local provider is the deterministic hashing generator and needs no
//! network. The HTTP provider talks to an OpenAI-compatible `/embeddings`
//! endpoint and checks every response against the dimension registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::generator::{DEFAULT_MAX_TEXT_LENGTH, generate_with_limit, validate_text};
use crate::registry::resolve_model;

/// Request for generating embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Model to use; the registry default when absent.
    pub model: Option<String>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Width of the embedding; always `embedding.len()`.
    pub dimensions: usize,

    /// Token usage (if available).
    pub tokens_used: Option<u64>,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Generate an embedding for the given text.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, requests: Vec<EmbeddingRequest>) -> Result<Vec<EmbeddingResponse>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.embed(request).await?);
        }
        Ok(results)
    }
}

/// In-process provider backed by the deterministic generator.
#[derive(Debug, Clone)]
pub struct LocalProvider {
    max_text_length: usize,
}

impl LocalProvider {
    /// Create a new local provider.
    pub fn new() -> Self {
        Self {
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }

    /// Set the maximum accepted text length, in characters.
    pub fn with_max_text_length(mut self, max_text_length: usize) -> Self {
        self.max_text_length = max_text_length;
        self
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        generate_with_limit(&request.text, request.model.as_deref(), self.max_text_length)
    }
}

/// Provider for an OpenAI-compatible embeddings API.
pub struct HttpProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL, without the `/embeddings` suffix.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    max_text_length: usize,
}

impl HttpProvider {
    /// Create a provider pointed at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api_key: None,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the maximum accepted text length, in characters.
    pub fn with_max_text_length(mut self, max_text_length: usize) -> Self {
        self.max_text_length = max_text_length;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmbeddingError::ProviderNotConfigured)?;
        let text = validate_text(&request.text, self.max_text_length)?;
        let info = resolve_model(request.model.as_deref())?;

        debug!("Requesting embedding from {} with model: {}", self.base_url, info.name);

        let body = serde_json::json!({
            "input": text,
            "model": info.name,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "{status}: {error_text}"
            )));
        }

        let result: ApiEmbeddingResponse = response.json().await?;
        let tokens_used = result.usage.map(|u| u.total_tokens);
        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding in response".to_string()))?
            .embedding;

        if embedding.len() != info.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                actual: embedding.len(),
                expected: Some(info.dimensions),
                model: Some(info.name.to_string()),
            });
        }

        info!("Generated remote embedding with {} dimensions", info.dimensions);

        Ok(EmbeddingResponse {
            embedding,
            model: info.name.to_string(),
            dimensions: info.dimensions,
            tokens_used,
        })
    }
}

/// Wire format of the embeddings API.
#[derive(Debug, Deserialize)]
struct ApiEmbeddingResponse {
    data: Vec<ApiEmbeddingData>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiEmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    total_tokens: u64,
}
