//! Indexing stage: PDF to persisted vector index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::chunker::{Chunk, TextSplitter};
use crate::config::Config;
use crate::embed::{create_embedder, EmbedError, Embedder};
use crate::extract::{
    ensure_pdf, save_all_content, DocumentExtractor, ExtractionError, ExtractionReport,
    IMAGES_SUBDIR,
};
use crate::index::{IndexError, IndexMeta, SourceInfo, VectorIndex};
use crate::models::{ContentItem, ContentKind, Passage};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("Embedding failed: {0}")]
    Embed(#[from] EmbedError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Background task failed: {0}")]
    Task(String),
}

/// Stage updates for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Extracting,
    Extracted { items: usize },
    Chunked { chunks: usize },
    Embedding { done: usize, total: usize },
    Saving,
}

/// What an indexing run produced.
#[derive(Debug, Clone)]
pub struct IndexSummary {
    pub source: SourceInfo,
    pub page_count: u32,
    pub text_items: usize,
    pub page_ocr_items: usize,
    pub table_items: usize,
    pub image_items: usize,
    pub passages: usize,
    /// Where `index.json` was written; `None` for in-memory builds.
    pub index_path: Option<PathBuf>,
}

impl IndexSummary {
    fn new(source: SourceInfo, report: &ExtractionReport, passages: usize) -> Self {
        Self {
            source,
            page_count: report.page_count,
            text_items: report.count(ContentKind::Text),
            page_ocr_items: report.count(ContentKind::PageOcr),
            table_items: report.count(ContentKind::Table),
            image_items: report.count(ContentKind::ImageOcr),
            passages,
            index_path: None,
        }
    }
}

pub struct IndexingPipeline {
    extractor: Arc<DocumentExtractor>,
    splitter: TextSplitter,
    embedder: Arc<dyn Embedder>,
}

impl IndexingPipeline {
    pub fn new(extractor: DocumentExtractor, splitter: TextSplitter, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            extractor: Arc::new(extractor),
            splitter,
            embedder,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        Ok(Self::new(
            DocumentExtractor::new(config.extraction.clone()),
            TextSplitter::from_config(&config.chunking),
            create_embedder(&config.embedding)?,
        ))
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Extract a PDF and write `all_content.json`/`.txt` plus images to `output_dir`.
    pub async fn extract(&self, pdf_path: &Path, output_dir: &Path) -> Result<ExtractionReport, PipelineError> {
        extract_document(self.extractor.clone(), pdf_path, output_dir).await
    }

    /// Chunk and embed content items into an index.
    pub async fn index_items(
        &self,
        items: &[ContentItem],
        source: SourceInfo,
        progress: &(dyn Fn(Progress) + Send + Sync),
    ) -> Result<VectorIndex, PipelineError> {
        let chunks = self.splitter.split_items(items);
        progress(Progress::Chunked {
            chunks: chunks.len(),
        });
        info!("Split {} items into {} chunks", items.len(), chunks.len());

        let passages = self.embed_chunks(chunks, progress).await?;
        let meta = IndexMeta::new(source, self.embedder.fingerprint());
        Ok(VectorIndex::build(meta, passages)?)
    }

    async fn embed_chunks(
        &self,
        chunks: Vec<Chunk>,
        progress: &(dyn Fn(Progress) + Send + Sync),
    ) -> Result<Vec<Passage>, PipelineError> {
        let total = chunks.len();
        let batch_size = self.embedder.batch_size().max(1);
        let mut passages = Vec::with_capacity(total);
        let mut pending = chunks.into_iter().peekable();

        progress(Progress::Embedding { done: 0, total });
        while pending.peek().is_some() {
            let batch: Vec<Chunk> = pending.by_ref().take(batch_size).collect();
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(EmbedError::Count {
                    expected: batch.len(),
                    actual: vectors.len(),
                }
                .into());
            }
            passages.extend(batch.into_iter().zip(vectors).map(|(c, v)| c.into_passage(v)));
            progress(Progress::Embedding {
                done: passages.len(),
                total,
            });
        }

        Ok(passages)
    }

    /// Extract, chunk and embed without touching any index directory.
    pub async fn build_in_memory(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        progress: &(dyn Fn(Progress) + Send + Sync),
    ) -> Result<(VectorIndex, IndexSummary), PipelineError> {
        progress(Progress::Extracting);
        let report = self.extract(pdf_path, output_dir).await?;
        progress(Progress::Extracted {
            items: report.items.len(),
        });

        let path = pdf_path.to_path_buf();
        let pages = report.page_count;
        let source = tokio::task::spawn_blocking(move || SourceInfo::from_file(&path, pages))
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))??;

        let index = self.index_items(&report.items, source.clone(), progress).await?;
        let summary = IndexSummary::new(source, &report, index.len());
        Ok((index, summary))
    }

    /// Full indexing run: build, then save `index.json` into `index_dir`.
    ///
    /// Running twice on the same PDF yields the same passages and ids.
    pub async fn run(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        index_dir: &Path,
        progress: &(dyn Fn(Progress) + Send + Sync),
    ) -> Result<IndexSummary, PipelineError> {
        let (index, mut summary) = self.build_in_memory(pdf_path, output_dir, progress).await?;

        progress(Progress::Saving);
        let index_dir = index_dir.to_path_buf();
        let path = tokio::task::spawn_blocking(move || index.save(&index_dir))
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))??;

        summary.index_path = Some(path);
        Ok(summary)
    }
}

/// Run extraction on the blocking pool and dump the content to `output_dir`.
pub async fn extract_document(
    extractor: Arc<DocumentExtractor>,
    pdf_path: &Path,
    output_dir: &Path,
) -> Result<ExtractionReport, PipelineError> {
    let pdf_path = pdf_path.to_path_buf();
    let output_dir = output_dir.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<ExtractionReport, ExtractionError> {
        ensure_pdf(&pdf_path)?;
        let report = extractor.extract(&pdf_path, &output_dir.join(IMAGES_SUBDIR))?;
        save_all_content(&report.items, &output_dir)?;
        Ok(report)
    })
    .await
    .map_err(|e| PipelineError::Task(e.to_string()))?
    .map_err(PipelineError::from)
}

/// A progress callback that ignores updates.
pub fn no_progress(_: Progress) {}
