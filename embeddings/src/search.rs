//! Brute-force similarity ranking over one namespace.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::record::{Metadata, VectorRecord};
use crate::registry::is_supported_dimension;
use crate::similarity::{cosine_similarity, first_non_finite};

/// Results returned when the caller does not ask for a count.
pub const DEFAULT_TOP_K: usize = 10;

/// Upper bound on `top_k`.
pub const MAX_TOP_K: usize = 100;

/// Knobs for a single search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of hits, after filtering.
    pub top_k: usize,

    /// Ceiling `top_k` is checked against.
    pub max_top_k: usize,

    /// Minimum score a hit must reach, in `[0.0, 1.0]`.
    pub similarity_threshold: f32,

    /// Every key must be present on the record with an equal value.
    pub metadata_filter: Option<Metadata>,

    pub include_metadata: bool,
    pub include_embeddings: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_top_k: MAX_TOP_K,
            similarity_threshold: 0.0,
            metadata_filter: None,
            include_metadata: true,
            include_embeddings: false,
        }
    }
}

impl SearchOptions {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_top_k(mut self, max_top_k: usize) -> Self {
        self.max_top_k = max_top_k;
        self
    }

    pub fn with_threshold(mut self, similarity_threshold: f32) -> Self {
        self.similarity_threshold = similarity_threshold;
        self
    }

    pub fn with_metadata_filter(mut self, filter: Metadata) -> Self {
        self.metadata_filter = Some(filter);
        self
    }

    pub fn with_include_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub fn with_include_embeddings(mut self, include: bool) -> Self {
        self.include_embeddings = include;
        self
    }

    /// Reject out-of-range parameters before any scan runs.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 || self.top_k > self.max_top_k {
            return Err(EmbeddingError::InvalidTopK {
                top_k: i64::try_from(self.top_k).unwrap_or(i64::MAX),
                max: self.max_top_k,
            });
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(EmbeddingError::InvalidThreshold {
                threshold: self.similarity_threshold,
            });
        }
        Ok(())
    }
}

/// Convert a caller-supplied, possibly negative `top_k`.
pub fn validate_top_k(top_k: i64, max_top_k: usize) -> Result<usize> {
    match usize::try_from(top_k) {
        Ok(value) if (1..=max_top_k).contains(&value) => Ok(value),
        _ => Err(EmbeddingError::InvalidTopK {
            top_k,
            max: max_top_k,
        }),
    }
}

/// One ranked match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub vector_id: String,
    pub namespace: String,
    pub document: String,
    pub score: f32,
    pub model: String,
    pub dimensions: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Embedding>,
}

/// Ranked hits plus scan bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,

    /// Records compared against the query.
    pub searched: usize,

    /// Records skipped because their width differs from the query.
    pub skipped: usize,
}

/// Rank `records` against `query`.
///
/// Records whose width differs from the query are skipped rather than
/// failing the search. Metadata filter and threshold both apply before the
/// `top_k` cut, and equal scores keep the iteration order of `records`.
pub fn rank<'a>(
    records: impl IntoIterator<Item = &'a VectorRecord>,
    query: &[f32],
    options: &SearchOptions,
) -> Result<SearchOutcome> {
    options.validate()?;
    if !is_supported_dimension(query.len()) {
        return Err(EmbeddingError::DimensionMismatch {
            actual: query.len(),
            expected: None,
            model: None,
        });
    }
    if let Some(index) = first_non_finite(query) {
        return Err(EmbeddingError::NonFiniteComponent { index });
    }

    let mut searched = 0;
    let mut skipped = 0;
    let mut scored: Vec<(OrderedFloat<f32>, &VectorRecord)> = Vec::new();

    for record in records {
        if record.embedding.len() != query.len() {
            skipped += 1;
            continue;
        }
        let filtered_out = options
            .metadata_filter
            .as_ref()
            .is_some_and(|filter| !matches_filter(&record.metadata, filter));
        if filtered_out {
            continue;
        }
        searched += 1;
        let score = cosine_similarity(query, &record.embedding)?;
        if score >= options.similarity_threshold {
            scored.push((OrderedFloat(score), record));
        }
    }

    if skipped > 0 {
        debug!("Skipped {skipped} vectors with width other than {}", query.len());
    }

    // Stable: ties keep insertion order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(options.top_k);

    let hits = scored
        .into_iter()
        .map(|(score, record)| SearchHit {
            vector_id: record.vector_id.clone(),
            namespace: record.namespace.clone(),
            document: record.document.clone(),
            score: score.0,
            model: record.model.clone(),
            dimensions: record.dimensions,
            metadata: options.include_metadata.then(|| record.metadata.clone()),
            embedding: options
                .include_embeddings
                .then(|| record.embedding.clone()),
        })
        .collect();

    Ok(SearchOutcome {
        hits,
        searched,
        skipped,
    })
}

/// Exact-match conjunction over the filter's keys.
///
/// Numbers compare by value, so a filter of `1` matches metadata stored as
/// `1.0`.
pub fn matches_filter(metadata: &Metadata, filter: &Metadata) -> bool {
    filter.iter().all(|(key, expected)| {
        metadata
            .get(key)
            .is_some_and(|actual| values_match(actual, expected))
    })
}

fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| values_match(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, a)| b.get(key).is_some_and(|b| values_match(a, b)))
        }
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(id: &str, embedding: Vec<f32>, metadata: serde_json::Value) -> VectorRecord {
        let now = Utc::now();
        let metadata = match metadata {
            serde_json::Value::Object(map) => map,
            _ => Metadata::new(),
        };
        VectorRecord {
            vector_id: id.to_string(),
            namespace: "default".to_string(),
            dimensions: embedding.len(),
            embedding,
            document: format!("document {id}"),
            model: "BAAI/bge-small-en-v1.5".to_string(),
            metadata,
            stored_at: now,
            updated_at: now,
        }
    }

    fn axis(index: usize, width: usize) -> Vec<f32> {
        let mut v = vec![0.0; width];
        v[index] = 1.0;
        v
    }

    fn blend(a: usize, b: usize, width: usize) -> Vec<f32> {
        let mut v = vec![0.0; width];
        v[a] = 0.7;
        v[b] = 0.7;
        v
    }

    #[test]
    fn test_rank_orders_by_score() {
        let records = vec![
            record("b", axis(1, 384), json!({})),
            record("c", blend(0, 1, 384), json!({})),
            record("a", axis(0, 384), json!({})),
        ];
        let outcome = rank(&records, &axis(0, 384), &SearchOptions::default()).unwrap();
        let ids: Vec<&str> = outcome.hits.iter().map(|h| h.vector_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert_eq!(outcome.searched, 3);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let records = vec![
            record("first", axis(0, 384), json!({})),
            record("second", axis(0, 384), json!({})),
            record("third", axis(0, 384), json!({})),
        ];
        let outcome = rank(&records, &axis(0, 384), &SearchOptions::default()).unwrap();
        let ids: Vec<&str> = outcome.hits.iter().map(|h| h.vector_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_filter_and_threshold_apply_before_top_k() {
        let records = vec![
            record("best-low", axis(0, 384), json!({"priority": "low"})),
            record("good-high", blend(0, 1, 384), json!({"priority": "high"})),
            record("bad-high", axis(1, 384), json!({"priority": "high"})),
        ];
        let mut filter = Metadata::new();
        filter.insert("priority".to_string(), json!("high"));
        let options = SearchOptions::default()
            .with_top_k(1)
            .with_threshold(0.5)
            .with_metadata_filter(filter);

        let outcome = rank(&records, &axis(0, 384), &options).unwrap();
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].vector_id, "good-high");
        assert!(outcome.hits[0].score >= 0.5);
    }

    #[test]
    fn test_mismatched_widths_are_skipped() {
        let records = vec![
            record("narrow", axis(0, 384), json!({})),
            record("wide", axis(0, 768), json!({})),
        ];
        let outcome = rank(&records, &axis(0, 384), &SearchOptions::default()).unwrap();
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_include_toggles() {
        let records = vec![record("a", axis(0, 384), json!({"k": 1}))];
        let options = SearchOptions::default()
            .with_include_metadata(false)
            .with_include_embeddings(true);
        let outcome = rank(&records, &axis(0, 384), &options).unwrap();
        assert!(outcome.hits[0].metadata.is_none());
        assert_eq!(outcome.hits[0].embedding.as_ref().map(Vec::len), Some(384));
    }

    #[test]
    fn test_parameter_validation() {
        let records: Vec<VectorRecord> = Vec::new();
        let query = axis(0, 384);
        assert!(matches!(
            rank(&records, &query, &SearchOptions::default().with_top_k(0)),
            Err(EmbeddingError::InvalidTopK { .. })
        ));
        assert!(matches!(
            rank(&records, &query, &SearchOptions::default().with_top_k(101)),
            Err(EmbeddingError::InvalidTopK { .. })
        ));
        assert!(matches!(
            rank(&records, &query, &SearchOptions::default().with_threshold(1.5)),
            Err(EmbeddingError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            rank(&records, &query, &SearchOptions::default().with_threshold(f32::NAN)),
            Err(EmbeddingError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            rank(&records, &[1.0; 10], &SearchOptions::default()),
            Err(EmbeddingError::DimensionMismatch { actual: 10, .. })
        ));
    }

    #[test]
    fn test_validate_top_k() {
        assert_eq!(validate_top_k(5, MAX_TOP_K).unwrap(), 5);
        assert!(validate_top_k(-1, MAX_TOP_K).is_err());
        assert!(validate_top_k(0, MAX_TOP_K).is_err());
        assert!(validate_top_k(500, MAX_TOP_K).is_err());
    }

    #[test]
    fn test_missing_filter_key_excludes() {
        let metadata = Metadata::new();
        let mut filter = Metadata::new();
        filter.insert("priority".to_string(), json!("high"));
        assert!(!matches_filter(&metadata, &filter));
        assert!(matches_filter(&metadata, &Metadata::new()));
    }

    #[test]
    fn test_extreme_magnitudes_still_match_themselves() {
        let mut large = vec![0.0; 384];
        large[0] = 1e20;
        let records = vec![record("large", large.clone(), json!({}))];
        let outcome = rank(&records, &large, &SearchOptions::default()).unwrap();
        assert_eq!(outcome.hits.len(), 1);
        assert!((outcome.hits[0].score - 1.0).abs() < 1e-6);

        let mut tiny = vec![0.0; 384];
        tiny[0] = 1e-25;
        let records = vec![record("tiny", tiny.clone(), json!({}))];
        let options = SearchOptions::default().with_threshold(0.5);
        let outcome = rank(&records, &tiny, &options).unwrap();
        assert_eq!(outcome.hits.len(), 1);
    }

    #[test]
    fn test_non_finite_query_rejected() {
        let records: Vec<VectorRecord> = Vec::new();
        let mut query = axis(0, 384);
        query[3] = f32::INFINITY;
        assert!(matches!(
            rank(&records, &query, &SearchOptions::default()),
            Err(EmbeddingError::NonFiniteComponent { index: 3 })
        ));
    }

    #[test]
    fn test_filter_compares_numbers_by_value() {
        let metadata = match json!({"amount": 1.0, "tags": [2.0, "x"]}) {
            serde_json::Value::Object(map) => map,
            _ => Metadata::new(),
        };
        let mut filter = Metadata::new();
        filter.insert("amount".to_string(), json!(1));
        assert!(matches_filter(&metadata, &filter));

        filter.insert("tags".to_string(), json!([2, "x"]));
        assert!(matches_filter(&metadata, &filter));

        filter.insert("amount".to_string(), json!(2));
        assert!(!matches_filter(&metadata, &filter));
    }
}
