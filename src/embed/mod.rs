//! Text embedding.
//!
//! Embedders turn passages and questions into L2-normalised vectors so the
//! index can rank by dot product. Two implementations:
//! - [`HttpEmbedder`]: an embedding server (text-embeddings-inference,
//!   any OpenAI-compatible `/v1/embeddings`, or Ollama `/api/embed`)
//! - [`HashingEmbedder`]: deterministic feature hashing, fully offline

mod config;
mod hashing;
mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{EmbeddingConfig, EmbeddingProvider};
pub use hashing::HashingEmbedder;
pub use http::HttpEmbedder;

/// Errors that can occur while embedding.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Embedding API error: {0}")]
    Api(String),
    #[error("Failed to parse embedding response: {0}")]
    Parse(String),
    #[error("Expected {expected} embeddings, got {actual}")]
    Count { expected: usize, actual: usize },
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    Dimensions { expected: usize, actual: usize },
}

/// Identifies the vector space an embedder produces.
///
/// Stored in the index so vectors from different models are never compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingFingerprint {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}

impl std::fmt::Display for EmbeddingFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} ({} dims)", self.provider, self.model, self.dimensions)
    }
}

/// Produces normalised embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per text, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a single question.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbedError::Count {
            expected: 1,
            actual: 0,
        })
    }

    fn dimensions(&self) -> usize;

    fn fingerprint(&self) -> EmbeddingFingerprint;

    /// Preferred number of texts per `embed` call.
    fn batch_size(&self) -> usize {
        32
    }
}

/// Build the embedder selected by `config`.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbedError> {
    Ok(match config.provider {
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(config.dimensions)),
        EmbeddingProvider::OpenAI | EmbeddingProvider::Ollama => {
            Arc::new(HttpEmbedder::new(config.clone())?)
        }
    })
}

/// Scale `vector` to unit length. Zero vectors are left as is.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}
