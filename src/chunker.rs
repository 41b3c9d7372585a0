//! Recursive character text splitter.
//!
//! Text is split on the first separator from `["\n\n", "\n", " ", ""]` that
//! occurs in it. Separators stay attached to the start of the following
//! piece. Pieces shorter than the chunk size are merged greedily, carrying up
//! to `chunk_overlap` characters of trailing pieces into the next chunk;
//! pieces that are still too long are split again with the remaining
//! separators. Lengths are measured in characters.

use std::collections::HashMap;

use tracing::warn;

use crate::config::ChunkingConfig;
use crate::models::{ContentItem, ContentKind, Passage};

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A chunk of one content item, not yet embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub page: u32,
    pub kind: ContentKind,
}

impl Chunk {
    pub fn into_passage(self, embedding: Vec<f32>) -> Passage {
        Passage {
            id: self.id,
            text: self.text,
            page: self.page,
            kind: self.kind,
            embedding,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

impl TextSplitter {
    /// An overlap not smaller than the chunk size is clamped to `chunk_size - 1`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let clamped = chunk_overlap.min(chunk_size - 1);
        if clamped != chunk_overlap {
            warn!(
                "Chunk overlap {} is not smaller than chunk size {}, using {}",
                chunk_overlap, chunk_size, clamped
            );
        }
        Self {
            chunk_size,
            chunk_overlap: clamped,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split every item on its own; chunks inherit the item's page and kind.
    ///
    /// Ids number chunks per (page, kind) in input order, so the same items
    /// always produce the same ids.
    pub fn split_items(&self, items: &[ContentItem]) -> Vec<Chunk> {
        let mut ordinals: HashMap<(u32, ContentKind), usize> = HashMap::new();
        let mut chunks = Vec::new();

        for item in items {
            for text in self.split_text(&item.content) {
                let ordinal = ordinals.entry((item.page, item.kind)).or_insert(0);
                chunks.push(Chunk {
                    id: Passage::make_id(item.page, item.kind, *ordinal),
                    text,
                    page: item.page,
                    kind: item.kind,
                });
                *ordinal += 1;
            }
        }

        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep.as_str();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut good: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                chunks.extend(self.merge(&good));
                good.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good.is_empty() {
            chunks.extend(self.merge(&good));
        }

        chunks
    }

    /// Greedily combine pieces into chunks of at most `chunk_size` chars.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut total = 0usize;
        let mut start = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }
                if start < window.len() {
                    push_joined(&mut chunks, &window[start..]);
                    // Drop leading pieces until the carried tail fits the overlap
                    while start < window.len()
                        && (total > self.chunk_overlap
                            || (total + len > self.chunk_size && total > 0))
                    {
                        total -= window[start].1;
                        start += 1;
                    }
                }
            }
            window.push((piece, len));
            total += len;
        }

        push_joined(&mut chunks, &window[start..]);
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn push_joined(chunks: &mut Vec<String>, pieces: &[(&str, usize)]) {
    let joined: String = pieces.iter().map(|(p, _)| *p).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split on `separator`, keeping each separator at the start of the piece
/// that follows it. An empty separator splits into characters. Empty pieces
/// are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}
