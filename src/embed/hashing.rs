//! Offline feature-hashing embedder.
//!
//! Each lower-cased word is hashed into one of `dimensions` buckets with a
//! sign taken from the hash, so shared vocabulary means high cosine
//! similarity. Retrieval quality is well below a neural model, but it needs
//! no server and its output never changes between runs.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{normalize, EmbedError, Embedder, EmbeddingFingerprint};

pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn fingerprint(&self) -> EmbeddingFingerprint {
        EmbeddingFingerprint {
            provider: "hashing".to_string(),
            model: "feature-hashing-v1".to_string(),
            dimensions: self.dimensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_deterministic() {
        let e = HashingEmbedder::new(128);
        assert_eq!(e.embed_text("Quarterly revenue"), e.embed_text("Quarterly revenue"));
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let e = HashingEmbedder::new(128);
        assert_eq!(e.embed_text("Revenue, growth!"), e.embed_text("revenue growth"));
    }

    #[test]
    fn test_shared_words_rank_higher() {
        let e = HashingEmbedder::new(256);
        let query = e.embed_text("water supply reservoir");
        let related = e.embed_text("The reservoir holds the city water supply.");
        let unrelated = e.embed_text("Ticket prices for the concert rose sharply.");
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn test_unit_length_or_zero() {
        let e = HashingEmbedder::new(64);
        let v = e.embed_text("some words here");
        assert!((dot(&v, &v) - 1.0).abs() < 1e-5);
        assert!(e.embed_text("  ...  ").iter().all(|x| *x == 0.0));
    }
}
