//! Deterministic embedding generation.
//!
//! Vectors are built by feature hashing: every lower-cased word and every
//! adjacent word pair is hashed with SHA-256 together with the model name,
//! and the digest picks a handful of buckets and signs to accumulate into.
//! The result is L2-normalized. Texts that share words land close together,
//! unrelated texts are close to orthogonal, and the same `(text, model)` pair
//! always yields the same bits.

use sha2::{Digest, Sha256};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::provider::EmbeddingResponse;
use crate::registry::resolve_model;
use crate::similarity::normalize;

/// Default cap on input text length, in characters.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 8192;

/// Buckets touched per hashed feature (one per 4-byte digest chunk).
const PROJECTIONS_PER_FEATURE: usize = 8;

const WORD_WEIGHT: f32 = 1.0;
const BIGRAM_WEIGHT: f32 = 0.5;

/// Generate an embedding for `text` with `model`, or the default model.
pub fn generate(text: &str, model: Option<&str>) -> Result<EmbeddingResponse> {
    generate_with_limit(text, model, DEFAULT_MAX_TEXT_LENGTH)
}

/// Same as [`generate`] with an explicit text length cap.
pub fn generate_with_limit(
    text: &str,
    model: Option<&str>,
    max_text_length: usize,
) -> Result<EmbeddingResponse> {
    let text = validate_text(text, max_text_length)?;
    let info = resolve_model(model)?;

    let tokens = tokenize(text);
    let mut embedding: Embedding = vec![0.0; info.dimensions];
    for token in &tokens {
        accumulate(&mut embedding, info.name, token, WORD_WEIGHT);
    }
    for pair in tokens.windows(2) {
        let bigram = format!("{} {}", pair[0], pair[1]);
        accumulate(&mut embedding, info.name, &bigram, BIGRAM_WEIGHT);
    }
    normalize(&mut embedding);

    Ok(EmbeddingResponse {
        embedding,
        model: info.name.to_string(),
        dimensions: info.dimensions,
        tokens_used: Some(tokens.len() as u64),
    })
}

/// Reject blank or oversized text, returning the trimmed input.
pub fn validate_text(text: &str, max_text_length: usize) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EmbeddingError::EmptyInput);
    }
    let length = trimmed.chars().count();
    if length > max_text_length {
        return Err(EmbeddingError::TextTooLong {
            length,
            max_length: max_text_length,
        });
    }
    Ok(trimmed)
}

fn tokenize(text: &str) -> Vec<String> {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect();
    // Punctuation-only input still needs a feature.
    if tokens.is_empty() {
        vec![text.to_lowercase()]
    } else {
        tokens
    }
}

fn accumulate(embedding: &mut [f32], model: &str, feature: &str, weight: f32) {
    let digest = Sha256::new()
        .chain_update(model.as_bytes())
        .chain_update([0u8])
        .chain_update(feature.as_bytes())
        .finalize();
    let width = embedding.len();
    for chunk in digest.chunks_exact(4).take(PROJECTIONS_PER_FEATURE) {
        let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let bucket = (value >> 1) as usize % width;
        let sign = if value & 1 == 0 { 1.0 } else { -1.0 };
        embedding[bucket] += sign * weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DEFAULT_MODEL, get_dimensions, models};
    use crate::similarity::{cosine_similarity, magnitude};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generate_is_deterministic() {
        let first = generate("hello world", None).unwrap();
        let second = generate("hello world", None).unwrap();
        assert_eq!(first.embedding, second.embedding);
        assert_eq!(first.model, DEFAULT_MODEL);
        assert_eq!(first.dimensions, 384);
    }

    #[test]
    fn test_output_width_matches_registry() {
        for info in models() {
            let response = generate("compliance event for agent", Some(info.name)).unwrap();
            assert_eq!(response.embedding.len(), info.dimensions);
            assert_eq!(response.dimensions, get_dimensions(info.name).unwrap());
        }
    }

    #[test]
    fn test_output_is_unit_length() {
        let response = generate("transfer 100 USDC to merchant", None).unwrap();
        assert!((magnitude(&response.embedding) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_models_produce_different_vectors() {
        let a = generate("hello world", Some("sentence-transformers/all-MiniLM-L6-v2")).unwrap();
        let b = generate("hello world", Some(DEFAULT_MODEL)).unwrap();
        assert_ne!(a.embedding, b.embedding);
    }

    #[test]
    fn test_shared_words_score_higher() {
        let query = generate("payment risk assessment", None).unwrap();
        let related = generate("risk assessment for a payment", None).unwrap();
        let unrelated = generate("weather forecast tomorrow", None).unwrap();

        let related_score = cosine_similarity(&query.embedding, &related.embedding).unwrap();
        let unrelated_score = cosine_similarity(&query.embedding, &unrelated.embedding).unwrap();
        assert!(related_score > unrelated_score);
        assert!(related_score > 0.5);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(generate("", None), Err(EmbeddingError::EmptyInput)));
        assert!(matches!(
            generate("   \n\t", None),
            Err(EmbeddingError::EmptyInput)
        ));
    }

    #[test]
    fn test_unknown_model_rejected() {
        let err = generate("hello", Some("not-a-model")).unwrap_err();
        assert!(matches!(err, EmbeddingError::ModelNotFound { .. }));
    }

    #[test]
    fn test_text_too_long() {
        let text = "a".repeat(20);
        let err = generate_with_limit(&text, None, 10).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::TextTooLong {
                length: 20,
                max_length: 10
            }
        ));
    }

    #[test]
    fn test_punctuation_only_text_still_embeds() {
        let response = generate("?!", None).unwrap();
        assert!(magnitude(&response.embedding) > 0.0);
    }
}
