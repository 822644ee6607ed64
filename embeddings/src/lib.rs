//! # Embeddings
//!
//! Embedding generation, namespaced vector storage and similarity search for
//! the Agent-402 backend.
//!
//! ## Features
//!
//! - **Dimension Registry**: fixed output width per supported model
//! - **Embedding Generation**: deterministic local vectors, or an
//!   OpenAI-compatible HTTP provider
//! - **Vector Store**: upsert / strict insert / get / delete / list per namespace
//! - **Similarity Search**: cosine ranking with metadata filter, threshold and top-k
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  registry ──► EmbeddingProvider ──► Embedding                   │
//! │                                        │                        │
//! │                                        ▼                        │
//! │                 VectorStore (namespace → id → VectorRecord)     │
//! │                                        │                        │
//! │                                        ▼                        │
//! │                     search::rank (cosine, filter, top-k)        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod generator;
pub mod provider;
pub mod record;
pub mod registry;
pub mod search;
pub mod similarity;
pub mod store;

pub use error::{EmbeddingError, ErrorKind, Result};
pub use generator::generate;
pub use provider::{
    EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, HttpProvider, LocalProvider,
};
pub use record::{DEFAULT_NAMESPACE, Metadata, UpsertRequest, VectorRecord};
pub use registry::{DEFAULT_MODEL, ModelInfo, SUPPORTED_DIMENSIONS};
pub use search::{SearchHit, SearchOptions, SearchOutcome};
pub use similarity::cosine_similarity;
pub use store::{NamespaceStats, UpsertOutcome, VectorPage, VectorStore};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
