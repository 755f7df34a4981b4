//! Local hashed embedder
//!
//! Feature-hashing embedder over word tokens: each token is hashed into
//! one of a fixed number of buckets with a hash-derived sign, and the
//! resulting vector is L2 normalized. Fully offline and deterministic,
//! so identical text always embeds identically across runs and
//! machines, which is what the change-detection cache and the
//! similarity gates need.

use async_trait::async_trait;
use bddgen_core::{Embedder, Result};

/// Embedding dimensionality.
pub(crate) const EMBEDDING_DIM: usize = 384;

/// Deterministic bag-of-words embedder with signed feature hashing.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct HashedEmbedder;

impl HashedEmbedder {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    fn embed_sync(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; EMBEDDING_DIM];
        for token in tokenize(text) {
            let digest = blake3::hash(token.as_bytes());
            let bytes = digest.as_bytes();
            let bucket = u64::from_le_bytes(
                bytes[..8].try_into().expect("digest is 32 bytes"),
            ) as usize
                % EMBEDDING_DIM;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let magnitude = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for v in &mut vector {
                *v /= magnitude;
            }
        }
        vector
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl Embedder for HashedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::embed_sync(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bddgen_core::cosine_similarity;

    #[test]
    fn identical_text_embeds_identically() {
        let a = HashedEmbedder::embed_sync("The Login Page is the first page");
        let b = HashedEmbedder::embed_sync("The Login Page is the first page");
        assert_eq!(a, b);
        assert_eq!(a.len(), EMBEDDING_DIM);
    }

    #[test]
    fn vectors_are_unit_length() {
        let v = HashedEmbedder::embed_sync("some text to embed");
        let magnitude = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_embeds_to_zero() {
        let v = HashedEmbedder::embed_sync("   ");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn overlapping_text_scores_higher_than_disjoint() {
        let base = HashedEmbedder::embed_sync("login form with username and password");
        let near = HashedEmbedder::embed_sync("login form with username field");
        let far = HashedEmbedder::embed_sync("dashboard chart rendering pipeline");
        assert!(cosine_similarity(&base, &near) > cosine_similarity(&base, &far));
    }

    #[test]
    fn case_is_normalized() {
        let a = HashedEmbedder::embed_sync("LOGIN PAGE");
        let b = HashedEmbedder::embed_sync("login page");
        assert_eq!(a, b);
    }
}
