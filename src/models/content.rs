//! Page-tagged content extracted from a PDF.
//!
//! Every piece of extracted content (page text, a detected table, OCR text
//! from an embedded image) carries the 1-based page it came from, so that
//! answers can cite pages later on.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of extracted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Text layer of a page.
    Text,
    /// Text of a page recovered by OCR because its text layer was too sparse.
    PageOcr,
    /// A table rendered as markdown.
    Table,
    /// OCR text of an image embedded in a page.
    ImageOcr,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::PageOcr => "page_ocr",
            Self::Table => "table",
            Self::ImageOcr => "image_ocr",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "page_ocr" => Some(Self::PageOcr),
            "table" => Some(Self::Table),
            "image_ocr" => Some(Self::ImageOcr),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A block of extracted content tagged with its source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub content: String,
    /// 1-based page number.
    pub page: u32,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Position of the table on its page (tables only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    /// Where the source image was written (image OCR only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
}

impl ContentItem {
    pub fn text(page: u32, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            page,
            kind: ContentKind::Text,
            table_number: None,
            image_path: None,
        }
    }

    pub fn page_ocr(page: u32, content: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::PageOcr,
            ..Self::text(page, content)
        }
    }

    pub fn table(page: u32, table_number: u32, markdown: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Table,
            table_number: Some(table_number),
            ..Self::text(page, markdown)
        }
    }

    pub fn image_ocr(page: u32, image_path: PathBuf, ocr_text: &str) -> Self {
        Self {
            kind: ContentKind::ImageOcr,
            image_path: Some(image_path),
            ..Self::text(page, format!("Image OCR (Page {}):\n{}", page, ocr_text))
        }
    }
}
