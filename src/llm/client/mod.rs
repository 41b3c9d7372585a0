//! LLM client for answering questions over retrieved context.
//!
//! Speaks OpenAI-compatible chat completions (Groq by default) or the Ollama
//! generate API.

mod config;
mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use config::{LlmConfig, LlmProvider};
pub use prompts::DEFAULT_QA_PROMPT;

/// Something that turns a prompt into a completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model name for display.
    fn model_name(&self) -> &str;
}

/// LLM client.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Chat completions request format.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completions response format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Hosted endpoints need a key; local ones don't.
    fn api_key(&self) -> Result<Option<&str>, LlmError> {
        match self.config.api_key.as_deref() {
            Some(key) => Ok(Some(key)),
            None if self.config.provider == LlmProvider::OpenAI && !self.config.is_local() => {
                Err(LlmError::MissingApiKey)
            }
            None => Ok(None),
        }
    }

    /// Check if the LLM service is reachable with the configured credentials.
    pub async fn is_available(&self) -> bool {
        let Ok(key) = self.api_key() else {
            return false;
        };
        let url = match self.config.provider {
            LlmProvider::Ollama => format!("{}/api/tags", self.config.base_url()),
            LlmProvider::OpenAI => format!("{}/v1/models", self.config.base_url()),
        };
        let mut req = self.client.get(&url);
        if let Some(key) = key {
            req = req.bearer_auth(key);
        }
        match req.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Call an OpenAI-compatible chat completions endpoint.
    async fn call_openai(&self, prompt: &str) -> Result<String, LlmError> {
        let key = self.api_key()?;
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatRequestMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.config.base_url());
        let mut req = self.client.post(&url).json(&request);
        if let Some(key) = key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        extract_chat_content(parsed)
    }

    /// Call Ollama API with a prompt.
    async fn call_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.base_url());
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::NOT_FOUND && body.contains("model") {
                return Err(LlmError::ModelNotFound(self.config.model.clone()));
            }
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(ollama_resp.response)
    }
}

fn extract_chat_content(resp: ChatResponse) -> Result<String, LlmError> {
    if let Some(error) = resp.error {
        return Err(LlmError::Api(error.message));
    }
    resp.choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::Parse("Response has no choices".to_string()))
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(
            "Calling {} model {} ({} prompt bytes)",
            self.config.provider.as_str(),
            self.config.model,
            prompt.len()
        );
        let response = match self.config.provider {
            LlmProvider::OpenAI => self.call_openai(prompt).await?,
            LlmProvider::Ollama => self.call_ollama(prompt).await?,
        };

        let answer = response.trim().to_string();
        if answer.is_empty() {
            return Err(LlmError::Parse("Empty response".to_string()));
        }
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug)]
pub enum LlmError {
    /// Hosted provider configured without an API key
    MissingApiKey,
    /// Failed to connect to LLM service
    Connection(String),
    /// API returned an error
    Api(String),
    /// Failed to parse response
    Parse(String),
    /// Model not available
    ModelNotFound(String),
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::MissingApiKey => write!(
                f,
                "No API key configured. Set GROQ_API_KEY (or LLM_API_KEY) in the environment or .env file"
            ),
            LlmError::Connection(msg) => write!(f, "Connection error: {}", msg),
            LlmError::Api(msg) => write!(f, "API error: {}", msg),
            LlmError::Parse(msg) => write!(f, "Parse error: {}", msg),
            LlmError::ModelNotFound(msg) => write!(f, "Model not found: {}", msg),
        }
    }
}

impl std::error::Error for LlmError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hosted_provider_without_key_fails_fast() {
        let client = LlmClient::new(LlmConfig::default()).unwrap();
        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
        assert!(err.to_string().contains("GROQ_API_KEY"));
        assert!(!client.is_available().await);
    }

    #[test]
    fn test_local_endpoint_needs_no_key() {
        let client =
            LlmClient::new(LlmConfig::default().with_endpoint("http://localhost:8000")).unwrap();
        assert!(matches!(client.api_key(), Ok(None)));
    }

    #[test]
    fn test_extract_chat_content() {
        let json = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Page 3 says 42."}}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_chat_content(resp).unwrap(), "Page 3 says 42.");
    }

    #[test]
    fn test_extract_chat_error() {
        let json = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        let err = extract_chat_content(resp).unwrap_err();
        assert_eq!(err.to_string(), "API error: Invalid API Key");
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "llama-3.1-8b-instant",
            messages: vec![ChatRequestMessage {
                role: "user",
                content: "q",
            }],
            max_tokens: 16,
            temperature: 0.1,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["model"], "llama-3.1-8b-instant");
    }
}
