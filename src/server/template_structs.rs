//! Askama template structs for the web interface.
//!
//! Each struct corresponds to an HTML template in the templates/ directory.
//! Askama provides compile-time verification that templates are valid.

use askama::Template;

use crate::models::{ChatMessage, SourcePassage};

/// Characters of a source passage shown under an answer.
const SOURCE_PREVIEW_CHARS: usize = 400;

/// Questions offered as one-click buttons once a document is loaded.
pub const SAMPLE_QUESTIONS: [&str; 5] = [
    "What is this document about?",
    "What are the key findings?",
    "Are there any tables or statistics?",
    "What recommendations are provided?",
    "Summarize the main points",
];

/// Helper struct for a cited passage.
pub struct SourceRow {
    pub number: usize,
    pub page: u32,
    pub kind: String,
    pub preview: String,
    pub truncated: bool,
}

impl SourceRow {
    fn new(number: usize, source: &SourcePassage) -> Self {
        let preview = source.preview(SOURCE_PREVIEW_CHARS);
        Self {
            number,
            page: source.page,
            kind: source.kind.to_string(),
            truncated: preview.len() < source.content.len(),
            preview,
        }
    }
}

/// Helper struct for chat messages.
pub struct MessageRow {
    pub is_user: bool,
    pub content: String,
    pub sources: Vec<SourceRow>,
    pub has_sources: bool,
    pub pages_str: String,
}

impl From<&ChatMessage> for MessageRow {
    fn from(msg: &ChatMessage) -> Self {
        let sources: Vec<SourceRow> = msg
            .sources
            .iter()
            .enumerate()
            .map(|(i, s)| SourceRow::new(i + 1, s))
            .collect();

        let mut pages: Vec<u32> = msg.sources.iter().map(|s| s.page).collect();
        pages.sort_unstable();
        pages.dedup();
        let pages_str = pages
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            is_user: msg.is_user(),
            content: msg.content.clone(),
            has_sources: !sources.is_empty(),
            sources,
            pages_str,
        }
    }
}

/// Main page: upload form or chat.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub title: &'a str,
    pub has_document: bool,
    pub document_name: String,
    pub passage_count: usize,
    pub page_count: u32,
    pub embedding_model: String,
    pub llm_model: String,
    pub has_notice: bool,
    pub notice: String,
    pub messages: Vec<MessageRow>,
    pub has_messages: bool,
    pub sample_questions: Vec<&'a str>,
    pub max_upload_mb: usize,
}

/// Error page template.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub title: &'a str,
    pub message: &'a str,
}
