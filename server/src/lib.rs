//! # Agent-402 Server
//!
//! HTTP surface over the embeddings crate. Every project gets its own
//! [`agent402_embeddings::VectorStore`]; errors leave as
//! `{"detail": ..., "error_code": ...}`.
//!
//! ```text
//! GET    /health
//! GET    /v1/public/embeddings/models
//! POST   /v1/public/{project_id}/embeddings/generate
//! POST   /v1/public/{project_id}/embeddings/embed-and-store
//! POST   /v1/public/{project_id}/embeddings/search
//! POST   /v1/public/{project_id}/database/vectors/upsert
//! GET    /v1/public/{project_id}/database/vectors
//! GET    /v1/public/{project_id}/database/vectors/{vector_id}
//! DELETE /v1/public/{project_id}/database/vectors/{vector_id}
//! GET    /v1/public/{project_id}/database/namespaces
//! ```

pub mod config;
pub mod embeddings;
pub mod error;
pub mod routes;
pub mod state;
pub mod types;
pub mod vectors;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorBody};
pub use routes::router;
pub use state::{AppState, ProjectRegistry};
