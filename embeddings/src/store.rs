//! Namespaced in-memory vector store.

use std::collections::BTreeMap;

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EmbeddingError, Result};
use crate::record::{UpsertRequest, VectorRecord, resolve_namespace};
use crate::search::{SearchOptions, SearchOutcome, rank};

/// Result of a write.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    /// The record as stored.
    pub record: VectorRecord,

    /// `true` if the id was new to the namespace.
    pub created: bool,
}

/// One page of a namespace listing.
#[derive(Debug, Clone)]
pub struct VectorPage {
    pub records: Vec<VectorRecord>,

    /// Records in the namespace, regardless of paging.
    pub total: usize,
}

/// Per-namespace record count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceStats {
    pub namespace: String,
    pub vector_count: usize,
}

/// Vectors keyed by namespace, then id.
///
/// Each namespace keeps insertion order, which listings and tie-breaking in
/// search rely on. Overwriting an id keeps its position. The store is meant
/// to be built once and shared behind an `Arc`.
#[derive(Default)]
pub struct VectorStore {
    namespaces: RwLock<BTreeMap<String, IndexMap<String, VectorRecord>>>,
}

impl VectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a vector.
    pub async fn upsert(&self, request: UpsertRequest) -> Result<UpsertOutcome> {
        self.write(request, false).await
    }

    /// Create a vector, failing with [`EmbeddingError::VectorAlreadyExists`]
    /// if the id is taken. The existence check and the write happen under
    /// one lock.
    pub async fn insert_if_absent(&self, request: UpsertRequest) -> Result<UpsertOutcome> {
        self.write(request, true).await
    }

    async fn write(&self, request: UpsertRequest, strict: bool) -> Result<UpsertOutcome> {
        let validated = request.validate()?;
        let namespace = validated.namespace.clone();
        let vector_id = validated
            .vector_id
            .clone()
            .unwrap_or_else(generate_vector_id);
        let now = Utc::now();

        let mut namespaces = self.namespaces.write().await;
        let exists = namespaces
            .get(&namespace)
            .is_some_and(|records| records.contains_key(&vector_id));
        if exists && strict {
            return Err(EmbeddingError::VectorAlreadyExists {
                vector_id,
                namespace,
            });
        }

        let records = namespaces.entry(namespace).or_default();
        let mut record = validated.into_record(vector_id.clone(), now);
        let created = match records.get_mut(&vector_id) {
            Some(existing) => {
                record.stored_at = existing.stored_at;
                *existing = record.clone();
                false
            }
            None => {
                records.insert(vector_id, record.clone());
                true
            }
        };

        debug!(
            "Stored vector {} in namespace {} ({} dims, created: {created})",
            record.vector_id, record.namespace, record.dimensions
        );

        Ok(UpsertOutcome { record, created })
    }

    /// Fetch a vector by id.
    pub async fn get(&self, namespace: &str, vector_id: &str) -> Result<VectorRecord> {
        let namespace = resolve_namespace(Some(namespace))?;
        let namespaces = self.namespaces.read().await;
        namespaces
            .get(&namespace)
            .and_then(|records| records.get(vector_id))
            .cloned()
            .ok_or_else(|| EmbeddingError::VectorNotFound {
                vector_id: vector_id.to_string(),
                namespace,
            })
    }

    /// Remove a vector. Returns `false` if it was not there.
    pub async fn delete(&self, namespace: &str, vector_id: &str) -> Result<bool> {
        let namespace = resolve_namespace(Some(namespace))?;
        let mut namespaces = self.namespaces.write().await;
        let removed = namespaces
            .get_mut(&namespace)
            .and_then(|records| records.shift_remove(vector_id))
            .is_some();
        if removed {
            debug!("Deleted vector {vector_id} from namespace {namespace}");
        }
        Ok(removed)
    }

    /// One page of a namespace, in insertion order.
    pub async fn list(&self, namespace: &str, limit: usize, offset: usize) -> Result<VectorPage> {
        let namespace = resolve_namespace(Some(namespace))?;
        let namespaces = self.namespaces.read().await;
        let Some(records) = namespaces.get(&namespace) else {
            return Ok(VectorPage {
                records: Vec::new(),
                total: 0,
            });
        };
        Ok(VectorPage {
            records: records.values().skip(offset).take(limit).cloned().collect(),
            total: records.len(),
        })
    }

    /// Number of vectors in a namespace.
    pub async fn count(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map_or(0, IndexMap::len)
    }

    /// Number of vectors across all namespaces.
    pub async fn len(&self) -> usize {
        self.namespaces.read().await.values().map(IndexMap::len).sum()
    }

    /// Check if the store holds no vectors at all.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Non-empty namespaces with their sizes, sorted by name.
    pub async fn stats(&self) -> Vec<NamespaceStats> {
        self.namespaces
            .read()
            .await
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(namespace, records)| NamespaceStats {
                namespace: namespace.clone(),
                vector_count: records.len(),
            })
            .collect()
    }

    /// Rank the vectors of one namespace against `query`.
    pub async fn search(
        &self,
        namespace: &str,
        query: &[f32],
        options: &SearchOptions,
    ) -> Result<SearchOutcome> {
        let namespace = resolve_namespace(Some(namespace))?;
        options.validate()?;
        let namespaces = self.namespaces.read().await;
        match namespaces.get(&namespace) {
            Some(records) => rank(records.values(), query, options),
            None => rank(std::iter::empty(), query, options),
        }
    }

    /// Drop every vector in a namespace, returning how many were removed.
    pub async fn clear_namespace(&self, namespace: &str) -> usize {
        let removed = self
            .namespaces
            .write()
            .await
            .remove(namespace)
            .map_or(0, |records| records.len());
        info!("Cleared {removed} vectors from namespace {namespace}");
        removed
    }

    /// Drop everything.
    pub async fn clear_all(&self) {
        self.namespaces.write().await.clear();
        info!("Cleared vector store");
    }
}

fn generate_vector_id() -> String {
    format!("vec_{}", Uuid::new_v4().simple())
}
