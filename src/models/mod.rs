//! Data models for docqa.

mod answer;
mod chat;
mod content;
mod passage;

pub use answer::{Answer, SourcePassage};
pub use chat::{ChatMessage, ChatRole};
pub use content::{ContentItem, ContentKind};
pub use passage::Passage;
