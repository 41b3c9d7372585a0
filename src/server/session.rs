//! The single in-process chat session behind the web UI.

use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::models::ChatMessage;
use crate::qa::QueryEngine;

/// Loaded document plus the conversation about it.
#[derive(Default)]
pub struct Session {
    pub document: Option<String>,
    pub engine: Option<Arc<QueryEngine>>,
    pub messages: Vec<ChatMessage>,
    /// One-shot status line shown on the next page render.
    pub notice: Option<String>,
}

impl Session {
    /// Switch to a new document. The chat history starts over.
    pub fn load(&mut self, document: String, engine: QueryEngine, notice: String) {
        self.document = Some(document);
        self.engine = Some(Arc::new(engine));
        self.messages.clear();
        self.notice = Some(notice);
    }

    /// Append a question and its reply if `engine` is still the loaded one.
    ///
    /// Returns `false` and records nothing when the document changed while
    /// the answer was being produced.
    pub fn record_exchange(
        &mut self,
        engine: &Arc<QueryEngine>,
        question: String,
        reply: ChatMessage,
    ) -> bool {
        let current = self
            .engine
            .as_ref()
            .is_some_and(|loaded| Arc::ptr_eq(loaded, engine));
        if current {
            self.messages.push(ChatMessage::user(question));
            self.messages.push(reply);
        }
        current
    }

    pub fn clear_chat(&mut self) {
        self.messages.clear();
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Plain-text transcript, or `None` when there are no messages.
    pub fn export(&self, now: DateTime<Local>) -> Option<String> {
        ChatMessage::export_transcript(&self.messages, self.document.as_deref(), now)
    }
}
