//! Answers returned by the query engine.

use serde::{Deserialize, Serialize};

use super::ContentKind;

/// A retrieved passage shown as a citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePassage {
    pub page: u32,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub content: String,
    pub score: f32,
}

impl SourcePassage {
    /// First `max_chars` characters of the content, for previews.
    pub fn preview(&self, max_chars: usize) -> String {
        crate::utils::truncate_chars(&self.content, max_chars).to_string()
    }
}

/// LLM answer plus the passages it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourcePassage>,
    /// Sorted, de-duplicated page numbers of `sources`.
    pub pages: Vec<u32>,
}

impl Answer {
    pub fn new(answer: String, sources: Vec<SourcePassage>) -> Self {
        let mut pages: Vec<u32> = sources.iter().map(|s| s.page).collect();
        pages.sort_unstable();
        pages.dedup();
        Self {
            answer,
            sources,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(page: u32) -> SourcePassage {
        SourcePassage {
            page,
            kind: ContentKind::Text,
            content: format!("content of page {}", page),
            score: 0.5,
        }
    }

    #[test]
    fn test_pages_are_sorted_and_unique() {
        let answer = Answer::new(
            "42".to_string(),
            vec![source(7), source(2), source(7), source(4)],
        );
        assert_eq!(answer.pages, vec![2, 4, 7]);
        assert_eq!(answer.sources.len(), 4);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let s = SourcePassage {
            page: 1,
            kind: ContentKind::Text,
            content: "héllo wörld".to_string(),
            score: 1.0,
        };
        assert_eq!(s.preview(4), "héll");
        assert_eq!(s.preview(100), "héllo wörld");
    }
}
