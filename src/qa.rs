//! Query engine: retrieve passages, prompt the LLM, cite pages.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::RetrievalConfig;
use crate::embed::{EmbedError, Embedder};
use crate::index::{IndexError, VectorIndex};
use crate::llm::{ChatModel, LlmError, DEFAULT_QA_PROMPT};
use crate::models::{Answer, SourcePassage};
use crate::utils::truncate_bytes;

#[derive(Debug, Error)]
pub enum QaError {
    #[error("Question is empty")]
    EmptyQuestion,
    #[error("The index contains no passages")]
    EmptyIndex,
    #[error("Embedding failed: {0}")]
    Embed(#[from] EmbedError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),
}

/// Answers questions against one loaded index.
pub struct QueryEngine {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn ChatModel>,
    config: RetrievalConfig,
    prompt_template: String,
}

impl QueryEngine {
    /// Fails if the index was built with a different embedding model.
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn ChatModel>,
        config: RetrievalConfig,
    ) -> Result<Self, QaError> {
        index.ensure_compatible(&embedder.fingerprint())?;
        Ok(Self {
            index,
            embedder,
            llm,
            config,
            prompt_template: DEFAULT_QA_PROMPT.to_string(),
        })
    }

    /// Load the persisted index in `index_dir` and build an engine over it.
    ///
    /// Reads the index file synchronously.
    pub fn open(
        index_dir: &Path,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn ChatModel>,
        config: RetrievalConfig,
    ) -> Result<Self, QaError> {
        let index = VectorIndex::load(index_dir)?;
        Self::new(Arc::new(index), embedder, llm, config)
    }

    /// Use a custom prompt with `{context}` and `{question}` placeholders.
    pub fn with_prompt(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// The `top_k` passages nearest to the question.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SourcePassage>, QaError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QaError::EmptyQuestion);
        }
        if self.index.is_empty() {
            return Err(QaError::EmptyIndex);
        }

        let query = self.embedder.embed_query(question).await?;
        let hits = self.index.search(&query, self.config.top_k)?;
        debug!(
            "Retrieved {} passages (best score {:.3})",
            hits.len(),
            hits.first().map(|h| h.score).unwrap_or(0.0)
        );
        Ok(hits.iter().map(|h| h.to_source()).collect())
    }

    /// Answer a question. The retrieved passages are both the prompt context
    /// and the citations, so cited pages are always indexed pages.
    pub async fn ask(&self, question: &str) -> Result<Answer, QaError> {
        let sources = self.retrieve(question).await?;
        let context = build_context(&sources, self.config.max_context_chars);
        let prompt = fill_prompt(&self.prompt_template, &context, question.trim());

        info!("Asking {} with {} passages", self.llm.model_name(), sources.len());
        let text = self.llm.complete(&prompt).await?;
        Ok(Answer::new(text.trim().to_string(), sources))
    }
}

/// Passage texts joined by blank lines, cut to `max_bytes` on a char boundary.
pub fn build_context(sources: &[SourcePassage], max_bytes: usize) -> String {
    let joined = sources
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    truncate_bytes(&joined, max_bytes).to_string()
}

/// Substitute `{context}` and `{question}` in one pass, so placeholder-like
/// text inside the document or question is left alone.
pub fn fill_prompt(template: &str, context: &str, question: &str) -> String {
    template
        .split("{context}")
        .map(|segment| segment.replace("{question}", question))
        .collect::<Vec<_>>()
        .join(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashingEmbedder;
    use crate::index::{IndexMeta, SourceInfo};
    use crate::models::{ContentKind, Passage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records prompts and answers with a fixed string.
    struct EchoModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("  The budget was 4.2 million.  ".to_string())
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::MissingApiKey)
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn index_for(embedder: &HashingEmbedder, texts: &[(u32, &str)]) -> Arc<VectorIndex> {
        let passages = texts
            .iter()
            .enumerate()
            .map(|(i, (page, text))| Passage {
                id: Passage::make_id(*page, ContentKind::Text, i),
                text: text.to_string(),
                page: *page,
                kind: ContentKind::Text,
                embedding: embedder.embed_text(text),
            })
            .collect();
        let meta = IndexMeta::new(
            SourceInfo {
                file_name: "budget.pdf".to_string(),
                sha256: String::new(),
                page_count: 10,
            },
            embedder.fingerprint(),
        );
        Arc::new(VectorIndex::build(meta, passages).unwrap())
    }

    fn engine(llm: Arc<dyn ChatModel>, top_k: usize) -> QueryEngine {
        let embedder = HashingEmbedder::new(256);
        let index = index_for(
            &embedder,
            &[
                (2, "The annual budget was 4.2 million dollars."),
                (5, "Staff headcount grew to 120 people."),
                (9, "The office moved to a new building downtown."),
            ],
        );
        let config = RetrievalConfig {
            top_k,
            ..Default::default()
        };
        QueryEngine::new(index, Arc::new(embedder), llm, config).unwrap()
    }

    #[tokio::test]
    async fn test_ask_cites_retrieved_pages() {
        let model = Arc::new(EchoModel {
            prompts: Mutex::new(Vec::new()),
        });
        let engine = engine(model.clone(), 2);

        let answer = engine.ask("What was the annual budget?").await.unwrap();
        assert_eq!(answer.answer, "The budget was 4.2 million.");
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].page, 2);
        assert!(answer.pages.iter().all(|p| [2, 5, 9].contains(p)));

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("The annual budget was 4.2 million dollars."));
        assert!(prompts[0].contains("Question: What was the annual budget?"));
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let engine = engine(Arc::new(FailingModel), 5);
        assert!(matches!(engine.ask("   ").await, Err(QaError::EmptyQuestion)));
    }

    #[tokio::test]
    async fn test_llm_error_propagates() {
        let engine = engine(Arc::new(FailingModel), 5);
        let err = engine.ask("budget?").await.unwrap_err();
        assert!(matches!(err, QaError::Llm(LlmError::MissingApiKey)));
    }

    #[test]
    fn test_mismatched_embedder_rejected() {
        let built_with = HashingEmbedder::new(256);
        let index = index_for(&built_with, &[(1, "text")]);
        let result = QueryEngine::new(
            index,
            Arc::new(HashingEmbedder::new(128)),
            Arc::new(FailingModel),
            RetrievalConfig::default(),
        );
        assert!(matches!(result, Err(QaError::Index(IndexError::EmbeddingMismatch { .. }))));
    }

    #[test]
    fn test_open_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let result = QueryEngine::open(
            dir.path(),
            Arc::new(HashingEmbedder::new(64)),
            Arc::new(FailingModel),
            RetrievalConfig::default(),
        );
        assert!(matches!(result, Err(QaError::Index(IndexError::NotFound(_)))));
    }

    #[test]
    fn test_build_context_truncates() {
        let source = |content: &str| SourcePassage {
            page: 1,
            kind: ContentKind::Text,
            content: content.to_string(),
            score: 1.0,
        };
        let sources = vec![source("first"), source("second")];
        assert_eq!(build_context(&sources, 1000), "first\n\nsecond");
        assert_eq!(build_context(&sources, 8), "first\n\ns");
    }

    #[test]
    fn test_fill_prompt_single_pass() {
        let out = fill_prompt(
            "C: {context}\nQ: {question}",
            "doc mentions {question}",
            "why?",
        );
        assert_eq!(out, "C: doc mentions {question}\nQ: why?");
    }

    #[test]
    fn test_default_prompt_fills() {
        let out = fill_prompt(DEFAULT_QA_PROMPT, "CTX", "Q?");
        assert!(out.contains("Context:\nCTX\n\nQuestion: Q?\n\nAnswer"));
        assert!(!out.contains("{context}"));
    }
}
