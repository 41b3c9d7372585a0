//! Embedding server client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{normalize, EmbedError, Embedder, EmbeddingConfig, EmbeddingFingerprint, EmbeddingProvider};

/// Request body shared by `/v1/embeddings` and Ollama `/api/embed`.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// OpenAI-compatible response format.
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Ollama response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedder backed by an HTTP embedding server.
pub struct HttpEmbedder {
    config: EmbeddingConfig,
    client: Client,
}

impl HttpEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbedError::Connection(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    fn url(&self) -> String {
        match self.config.provider {
            EmbeddingProvider::Ollama => format!("{}/api/embed", self.config.base_url()),
            _ => format!("{}/v1/embeddings", self.config.base_url()),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let request = EmbedRequest {
            model: &self.config.model,
            input: texts,
        };

        let mut builder = self.client.post(self.url()).json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| EmbedError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbedError::Api(format!("HTTP {}: {}", status, body)));
        }

        let vectors = match self.config.provider {
            EmbeddingProvider::Ollama => {
                let parsed: OllamaResponse = resp
                    .json()
                    .await
                    .map_err(|e| EmbedError::Parse(e.to_string()))?;
                parsed.embeddings
            }
            _ => {
                let mut parsed: OpenAiResponse = resp
                    .json()
                    .await
                    .map_err(|e| EmbedError::Parse(e.to_string()))?;
                parsed.data.sort_by_key(|d| d.index);
                parsed.data.into_iter().map(|d| d.embedding).collect()
            }
        };

        self.finish(texts.len(), vectors)
    }

    /// Validate count and dimensions, then normalise.
    fn finish(&self, expected: usize, mut vectors: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>, EmbedError> {
        if vectors.len() != expected {
            return Err(EmbedError::Count {
                expected,
                actual: vectors.len(),
            });
        }
        for v in vectors.iter_mut() {
            if v.len() != self.config.dimensions {
                return Err(EmbedError::Dimensions {
                    expected: self.config.dimensions,
                    actual: v.len(),
                });
            }
            normalize(v);
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size()) {
            debug!("Embedding batch of {} texts via {}", batch.len(), self.url());
            out.extend(self.embed_batch(batch).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn fingerprint(&self) -> EmbeddingFingerprint {
        EmbeddingFingerprint {
            provider: self.config.provider.as_str().to_string(),
            model: self.config.model.clone(),
            dimensions: self.config.dimensions,
        }
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder(provider: EmbeddingProvider, dims: usize) -> HttpEmbedder {
        HttpEmbedder::new(EmbeddingConfig {
            provider,
            endpoint: "http://localhost:8080/".to_string(),
            dimensions: dims,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_per_provider() {
        assert_eq!(
            embedder(EmbeddingProvider::OpenAI, 3).url(),
            "http://localhost:8080/v1/embeddings"
        );
        assert_eq!(
            embedder(EmbeddingProvider::Ollama, 3).url(),
            "http://localhost:8080/api/embed"
        );
    }

    #[test]
    fn test_openai_response_parses_out_of_order() {
        let json = r#"{"object":"list","data":[
            {"object":"embedding","index":1,"embedding":[0.0,2.0]},
            {"object":"embedding","index":0,"embedding":[1.0,0.0]}
        ],"model":"bge"}"#;
        let mut parsed: OpenAiResponse = serde_json::from_str(json).unwrap();
        parsed.data.sort_by_key(|d| d.index);
        assert_eq!(parsed.data[0].embedding, vec![1.0, 0.0]);
    }

    #[test]
    fn test_finish_normalizes_and_checks_dimensions() {
        let e = embedder(EmbeddingProvider::OpenAI, 2);
        let out = e.finish(1, vec![vec![0.0, 2.0]]).unwrap();
        assert_eq!(out, vec![vec![0.0, 1.0]]);

        let err = e.finish(1, vec![vec![1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, EmbedError::Dimensions { expected: 2, actual: 3 }));

        let err = e.finish(2, vec![vec![1.0, 0.0]]).unwrap_err();
        assert!(matches!(err, EmbedError::Count { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_fingerprint() {
        let fp = embedder(EmbeddingProvider::Ollama, 384).fingerprint();
        assert_eq!(fp.provider, "ollama");
        assert_eq!(fp.model, "BAAI/bge-small-en-v1.5");
        assert_eq!(fp.dimensions, 384);
    }
}
