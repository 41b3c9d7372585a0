//! LLM client configuration.

use serde::{Deserialize, Serialize};

use super::prompts::DEFAULT_QA_PROMPT;

const GROQ_ENDPOINT: &str = "https://api.groq.com/openai";
const OPENAI_ENDPOINT: &str = "https://api.openai.com";
const TOGETHER_ENDPOINT: &str = "https://api.together.xyz";
const OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions (Groq, OpenAI, Together.ai, llama.cpp, etc.)
    #[default]
    OpenAI,
    /// Ollama API
    Ollama,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "groq" | "together" => Some(Self::OpenAI),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }
}

/// Configuration for LLM client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (openai-compatible or ollama)
    #[serde(default)]
    pub provider: LlmProvider,
    /// API endpoint (provider-specific defaults apply)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key for hosted providers
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Model to answer with
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Custom QA prompt (uses {context} and {question} placeholders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa_prompt: Option<String>,
}

fn default_endpoint() -> String {
    GROQ_ENDPOINT.to_string()
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            qa_prompt: None,
        }
    }
}

impl LlmConfig {
    /// Check if the config equals the default (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        let mut base = Self::default();
        base.api_key = self.api_key.clone();
        *self == base
    }

    /// Apply environment variable overrides from `lookup`.
    ///
    /// Supported env vars:
    /// - `LLM_PROVIDER`: "groq", "openai", "together" or "ollama"
    /// - `LLM_ENDPOINT`: API endpoint (defaults based on provider)
    /// - `LLM_API_KEY`: API key for OpenAI-compatible providers
    /// - `LLM_MODEL`: Model name
    /// - `LLM_MAX_TOKENS`: Maximum tokens in response
    /// - `LLM_TEMPERATURE`: Generation temperature (0.0-1.0)
    /// - `LLM_QA_PROMPT`: Custom QA prompt
    ///
    /// Priority: LLM_PROVIDER wins over auto-detection from API keys.
    /// Without it, GROQ_API_KEY then OPENAI_API_KEY are picked up.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Check if provider is explicitly set - this is authoritative
        let explicit_provider = lookup("LLM_PROVIDER");
        if let Some(ref val) = explicit_provider {
            if let Some(provider) = LlmProvider::from_str(val) {
                self.provider = provider;
            }
        }

        // Explicit endpoint always wins
        let explicit_endpoint = lookup("LLM_ENDPOINT");
        if let Some(ref endpoint) = explicit_endpoint {
            self.endpoint = endpoint.clone();
        }

        // Explicit API key always wins
        if let Some(val) = lookup("LLM_API_KEY") {
            self.api_key = Some(val);
        }

        if let Some(ref provider_str) = explicit_provider {
            let provider_lower = provider_str.to_lowercase();

            if explicit_endpoint.is_none() {
                match provider_lower.as_str() {
                    "groq" => self.endpoint = GROQ_ENDPOINT.to_string(),
                    "openai" => self.endpoint = OPENAI_ENDPOINT.to_string(),
                    "together" => self.endpoint = TOGETHER_ENDPOINT.to_string(),
                    "ollama" => self.endpoint = OLLAMA_ENDPOINT.to_string(),
                    _ => {}
                }
            }

            if self.api_key.is_none() {
                match provider_lower.as_str() {
                    "groq" => self.api_key = lookup("GROQ_API_KEY"),
                    "openai" => self.api_key = lookup("OPENAI_API_KEY"),
                    // together uses LLM_API_KEY which we already checked
                    _ => {}
                }
            }
        } else if self.api_key.is_none() {
            // No explicit provider - auto-detect from available keys
            if let Some(key) = lookup("GROQ_API_KEY") {
                self.api_key = Some(key);
                self.provider = LlmProvider::OpenAI;
                if explicit_endpoint.is_none() {
                    self.endpoint = GROQ_ENDPOINT.to_string();
                }
            } else if let Some(key) = lookup("OPENAI_API_KEY") {
                self.api_key = Some(key);
                self.provider = LlmProvider::OpenAI;
                if explicit_endpoint.is_none() && self.endpoint == GROQ_ENDPOINT {
                    self.endpoint = OPENAI_ENDPOINT.to_string();
                }
            }
        }

        if let Some(val) = lookup("LLM_MODEL") {
            self.model = val;
        }
        if let Some(n) = lookup("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.max_tokens = n;
        }
        if let Some(t) = lookup("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.temperature = t;
        }
        if let Some(val) = lookup("LLM_QA_PROMPT") {
            self.qa_prompt = Some(val);
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// The endpoint with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// Whether the endpoint points at this machine (no API key needed).
    pub fn is_local(&self) -> bool {
        let url = self.base_url();
        let host = url
            .split("://")
            .nth(1)
            .unwrap_or(url)
            .split(|c: char| c == '/' || c == ':')
            .next()
            .unwrap_or("");
        matches!(host, "localhost" | "127.0.0.1" | "0.0.0.0")
    }

    /// Get the QA prompt, using custom or default.
    pub fn get_qa_prompt(&self) -> &str {
        self.qa_prompt.as_deref().unwrap_or(DEFAULT_QA_PROMPT)
    }
}
