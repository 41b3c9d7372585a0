//! LLM integration for answering questions.

mod client;

pub use client::{ChatModel, LlmClient, LlmConfig, LlmError, LlmProvider, DEFAULT_QA_PROMPT};
