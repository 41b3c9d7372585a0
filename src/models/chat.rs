//! Chat history kept by the web session.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::SourcePassage;

/// Who sent a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourcePassage>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<SourcePassage>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            sources,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }

    /// Render a conversation as the plain-text export format.
    ///
    /// Returns `None` when there is nothing to export.
    pub fn export_transcript(
        messages: &[ChatMessage],
        document: Option<&str>,
        now: DateTime<Local>,
    ) -> Option<String> {
        if messages.is_empty() {
            return None;
        }

        let mut out = format!("Chat History - {}\n", now.format("%Y-%m-%d %H:%M:%S"));
        out.push_str(&format!(
            "Document: {}\n",
            document.unwrap_or("Default Document")
        ));
        out.push_str(&"=".repeat(80));
        out.push_str("\n\n");

        for msg in messages {
            let who = if msg.is_user() { "You" } else { "Assistant" };
            out.push_str(&format!("{}: {}\n\n", who, msg.content));

            if msg.role == ChatRole::Assistant && !msg.sources.is_empty() {
                out.push_str("Sources:\n");
                for (i, source) in msg.sources.iter().enumerate() {
                    out.push_str(&format!(
                        "  [{}] Page {} ({})\n",
                        i + 1,
                        source.page,
                        source.kind
                    ));
                }
                out.push('\n');
            }

            out.push_str(&"-".repeat(80));
            out.push_str("\n\n");
        }

        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;
    use chrono::TimeZone;

    #[test]
    fn test_export_empty_history() {
        assert!(ChatMessage::export_transcript(&[], None, Local::now()).is_none());
    }

    #[test]
    fn test_export_lists_sources() {
        let messages = vec![
            ChatMessage::user("What is the budget?"),
            ChatMessage::assistant(
                "The budget is 12M.",
                vec![SourcePassage {
                    page: 4,
                    kind: ContentKind::Table,
                    content: "Budget | 12M".to_string(),
                    score: 0.9,
                }],
            ),
        ];
        let now = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let text = ChatMessage::export_transcript(&messages, Some("report.pdf"), now).unwrap();

        assert!(text.starts_with("Chat History - 2026-01-02 03:04:05\nDocument: report.pdf\n"));
        assert!(text.contains("You: What is the budget?\n\n"));
        assert!(text.contains("Assistant: The budget is 12M.\n\n"));
        assert!(text.contains("  [1] Page 4 (table)\n"));
        assert_eq!(text.matches(&"-".repeat(80)).count(), 2);
    }

    #[test]
    fn test_export_defaults_document_name() {
        let messages = vec![ChatMessage::user("hi")];
        let text = ChatMessage::export_transcript(&messages, None, Local::now()).unwrap();
        assert!(text.contains("Document: Default Document\n"));
    }
}
