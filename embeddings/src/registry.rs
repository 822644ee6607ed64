//! Dimension registry: which models exist and how wide their vectors are.

use serde::Serialize;

use crate::error::{EmbeddingError, Result};

/// Model used whenever a caller omits one.
pub const DEFAULT_MODEL: &str = "BAAI/bge-small-en-v1.5";

/// Output width of [`DEFAULT_MODEL`].
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Every vector width the store accepts.
pub const SUPPORTED_DIMENSIONS: [usize; 4] = [384, 768, 1024, 1536];

/// A supported embedding model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Model identifier as accepted by the API.
    pub name: &'static str,

    /// Fixed output width.
    pub dimensions: usize,

    /// Human readable description.
    pub description: &'static str,
}

impl ModelInfo {
    /// Whether this is the model used when none is given.
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_MODEL
    }
}

const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: DEFAULT_MODEL,
        dimensions: DEFAULT_DIMENSIONS,
        description: "Lightweight English model, the default for all embedding calls",
    },
    ModelInfo {
        name: "sentence-transformers/all-MiniLM-L6-v2",
        dimensions: 384,
        description: "Fast general purpose sentence model",
    },
    ModelInfo {
        name: "sentence-transformers/all-MiniLM-L12-v2",
        dimensions: 384,
        description: "Deeper MiniLM variant with better recall",
    },
    ModelInfo {
        name: "sentence-transformers/paraphrase-MiniLM-L6-v2",
        dimensions: 384,
        description: "MiniLM tuned for paraphrase detection",
    },
    ModelInfo {
        name: "sentence-transformers/all-mpnet-base-v2",
        dimensions: 768,
        description: "High quality general purpose model",
    },
    ModelInfo {
        name: "sentence-transformers/all-distilroberta-v1",
        dimensions: 768,
        description: "Distilled RoBERTa sentence model",
    },
    ModelInfo {
        name: "sentence-transformers/msmarco-distilbert-base-v4",
        dimensions: 768,
        description: "DistilBERT tuned for passage retrieval",
    },
    ModelInfo {
        name: "BAAI/bge-large-en-v1.5",
        dimensions: 1024,
        description: "Large English retrieval model",
    },
    ModelInfo {
        name: "text-embedding-3-small",
        dimensions: 1536,
        description: "Hosted embedding model with the widest supported output",
    },
];

/// All registered models, default first.
pub fn models() -> &'static [ModelInfo] {
    MODELS
}

/// Look up a model by name.
pub fn model_info(model: &str) -> Result<&'static ModelInfo> {
    MODELS
        .iter()
        .find(|info| info.name == model)
        .ok_or_else(|| EmbeddingError::ModelNotFound {
            model: model.to_string(),
        })
}

/// Output width for `model`.
pub fn get_dimensions(model: &str) -> Result<usize> {
    model_info(model).map(|info| info.dimensions)
}

/// Whether `model` is registered.
pub fn is_supported(model: &str) -> bool {
    MODELS.iter().any(|info| info.name == model)
}

/// Whether vectors of this width can be stored.
pub fn is_supported_dimension(dimensions: usize) -> bool {
    SUPPORTED_DIMENSIONS.contains(&dimensions)
}

/// First registered model producing vectors of the given width.
pub fn model_for_dimensions(dimensions: usize) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|info| info.dimensions == dimensions)
}

/// Resolve an optional model name, falling back to [`DEFAULT_MODEL`].
pub fn resolve_model(model: Option<&str>) -> Result<&'static ModelInfo> {
    model_info(model.unwrap_or(DEFAULT_MODEL))
}
