//! Embedding configuration.

use serde::{Deserialize, Serialize};

/// Embedding backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible `/v1/embeddings` (text-embeddings-inference, OpenAI, etc.)
    #[default]
    OpenAI,
    /// Ollama `/api/embed`
    Ollama,
    /// Offline feature hashing
    Hashing,
}

impl EmbeddingProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" | "tei" => Some(Self::OpenAI),
            "ollama" => Some(Self::Ollama),
            "hashing" | "hash" => Some(Self::Hashing),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
            Self::Hashing => "hashing",
        }
    }
}

/// Configuration for the embedder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,
    /// Server base URL (without `/v1/embeddings` or `/api/embed`)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Expected vector size; responses of another size are rejected.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_model() -> String {
    "BAAI/bge-small-en-v1.5".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_batch_size() -> usize {
    32
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            dimensions: default_dimensions(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply overrides from `lookup` (the environment in practice).
    ///
    /// Supported vars:
    /// - `EMBEDDING_PROVIDER`: "openai"/"tei" (default), "ollama" or "hashing"
    /// - `EMBEDDING_ENDPOINT`: server base URL (Ollama defaults to localhost:11434)
    /// - `EMBEDDING_API_KEY`
    /// - `EMBEDDING_MODEL`
    /// - `EMBEDDING_DIMENSIONS`
    /// - `EMBEDDING_BATCH_SIZE`
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(provider) = lookup("EMBEDDING_PROVIDER").and_then(|v| EmbeddingProvider::from_str(&v)) {
            self.provider = provider;
            if provider == EmbeddingProvider::Ollama && self.endpoint == default_endpoint() {
                self.endpoint = "http://localhost:11434".to_string();
            }
        }
        if let Some(val) = lookup("EMBEDDING_ENDPOINT") {
            self.endpoint = val;
        }
        if let Some(val) = lookup("EMBEDDING_API_KEY") {
            self.api_key = Some(val);
        }
        if let Some(val) = lookup("EMBEDDING_MODEL") {
            self.model = val;
        }
        if let Some(n) = lookup("EMBEDDING_DIMENSIONS").and_then(|v| v.parse().ok()) {
            self.dimensions = n;
        }
        if let Some(n) = lookup("EMBEDDING_BATCH_SIZE").and_then(|v| v.parse().ok()) {
            self.batch_size = n;
        }
        self
    }

    /// The endpoint with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, EmbeddingProvider::OpenAI);
        assert_eq!(config.model, "BAAI/bge-small-en-v1.5");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.batch_size, 32);
    }

    #[test]
    fn test_ollama_provider_switches_default_endpoint() {
        let config = EmbeddingConfig::default().with_overrides_from(|k| {
            (k == "EMBEDDING_PROVIDER").then(|| "ollama".to_string())
        });
        assert_eq!(config.provider, EmbeddingProvider::Ollama);
        assert_eq!(config.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_explicit_endpoint_wins() {
        let config = EmbeddingConfig::default().with_overrides_from(|k| match k {
            "EMBEDDING_PROVIDER" => Some("ollama".to_string()),
            "EMBEDDING_ENDPOINT" => Some("http://gpu-box:11434/".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url(), "http://gpu-box:11434");
    }

    #[test]
    fn test_provider_aliases() {
        assert_eq!(EmbeddingProvider::from_str("TEI"), Some(EmbeddingProvider::OpenAI));
        assert_eq!(EmbeddingProvider::from_str("hash"), Some(EmbeddingProvider::Hashing));
        assert_eq!(EmbeddingProvider::from_str("word2vec"), None);
    }
}
