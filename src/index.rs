//! Persisted vector index.
//!
//! A flat list of passages searched exactly by cosine similarity. Vectors
//! are normalised at embedding time, so the score is a dot product. This is
//! plenty for the few thousand passages a single PDF produces.
//!
//! On disk the index is one JSON manifest, `index.json`, holding the format
//! version, provenance of the source PDF, the embedding model that produced
//! the vectors, and every passage.

use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::embed::EmbeddingFingerprint;
use crate::models::{Passage, SourcePassage};

pub const INDEX_FILE: &str = "index.json";
pub const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("No index found at {0}; run `docqa index <pdf>` first")]
    NotFound(PathBuf),
    #[error("Unsupported index format version {found} (expected {expected}); rebuild the index")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("Index was built with {index}, but the configured embedder is {configured}; rebuild the index or change the embedding settings")]
    EmbeddingMismatch {
        index: EmbeddingFingerprint,
        configured: EmbeddingFingerprint,
    },
    #[error("Vector dimension mismatch: index has {expected}, got {actual}")]
    Dimensions { expected: usize, actual: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Index serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The PDF an index was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub file_name: String,
    pub sha256: String,
    pub page_count: u32,
}

impl SourceInfo {
    /// Describe `path`, hashing its contents.
    pub fn from_file(path: &Path, page_count: u32) -> std::io::Result<Self> {
        let mut file = BufReader::new(std::fs::File::open(path)?);
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            file_name,
            sha256: hex::encode(hasher.finalize()),
            page_count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub source: SourceInfo,
    pub embedding: EmbeddingFingerprint,
}

impl IndexMeta {
    pub fn new(source: SourceInfo, embedding: EmbeddingFingerprint) -> Self {
        Self {
            version: INDEX_FORMAT_VERSION,
            created_at: Utc::now(),
            source,
            embedding,
        }
    }
}

/// A passage matched by a search.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub passage: &'a Passage,
    pub score: f32,
}

impl SearchHit<'_> {
    pub fn to_source(&self) -> SourcePassage {
        SourcePassage {
            page: self.passage.page,
            kind: self.passage.kind,
            content: self.passage.text.clone(),
            score: self.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    pub meta: IndexMeta,
    passages: Vec<Passage>,
}

impl VectorIndex {
    /// Build an index, checking every vector has the declared dimension.
    pub fn build(meta: IndexMeta, passages: Vec<Passage>) -> Result<Self, IndexError> {
        let expected = meta.embedding.dimensions;
        if let Some(bad) = passages.iter().find(|p| p.embedding.len() != expected) {
            return Err(IndexError::Dimensions {
                expected,
                actual: bad.embedding.len(),
            });
        }
        Ok(Self { meta, passages })
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Distinct pages covered by the passages, ascending.
    pub fn indexed_pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.passages.iter().map(|p| p.page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }

    /// Top `k` passages by cosine similarity, best first.
    ///
    /// Equal scores keep insertion order. `k` larger than the index returns
    /// every passage.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>, IndexError> {
        let expected = self.meta.embedding.dimensions;
        if query.len() != expected {
            return Err(IndexError::Dimensions {
                expected,
                actual: query.len(),
            });
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .passages
            .iter()
            .map(|passage| SearchHit {
                passage,
                score: dot(query, &passage.embedding),
            })
            .collect();

        // Stable sort keeps insertion order among ties
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k.min(self.passages.len()));
        Ok(hits)
    }

    /// Fail unless the index was built by an embedder producing `configured` vectors.
    pub fn ensure_compatible(&self, configured: &EmbeddingFingerprint) -> Result<(), IndexError> {
        let index = &self.meta.embedding;
        if index.model != configured.model || index.dimensions != configured.dimensions {
            return Err(IndexError::EmbeddingMismatch {
                index: index.clone(),
                configured: configured.clone(),
            });
        }
        Ok(())
    }

    pub fn exists(dir: &Path) -> bool {
        dir.join(INDEX_FILE).is_file()
    }

    /// Write `index.json` into `dir` atomically.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, IndexError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(INDEX_FILE);

        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, self)?;
            std::io::Write::flush(&mut writer)?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| IndexError::Io(e.error))?;

        info!(
            "Saved index with {} passages to {}",
            self.passages.len(),
            path.display()
        );
        Ok(path)
    }

    /// Read `index.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let path = dir.join(INDEX_FILE);
        if !path.is_file() {
            return Err(IndexError::NotFound(dir.to_path_buf()));
        }

        let reader = BufReader::new(std::fs::File::open(&path)?);
        let index: VectorIndex = serde_json::from_reader(reader)?;

        if index.meta.version != INDEX_FORMAT_VERSION {
            return Err(IndexError::UnsupportedVersion {
                found: index.meta.version,
                expected: INDEX_FORMAT_VERSION,
            });
        }
        // Re-validate dimensions in case the file was edited
        let index = Self::build(index.meta, index.passages)?;

        debug!(
            "Loaded index of {} ({} passages)",
            index.meta.source.file_name,
            index.passages.len()
        );
        Ok(index)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
