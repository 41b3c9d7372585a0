//! Whole-document extraction: text layer, tables and image OCR.

use std::path::Path;

use tracing::{debug, info};

use super::images::extract_images;
use super::pdf::{page_count, page_text};
use super::tables::detect_tables;
use super::tesseract::Tesseract;
use super::tools::ExtractionError;
use crate::config::ExtractionConfig;
use crate::models::{ContentItem, ContentKind};
use crate::utils::non_whitespace_chars;

/// Result of extracting a document.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub page_count: u32,
    /// Text blocks first, then tables, then image OCR, in page order.
    pub items: Vec<ContentItem>,
}

impl ExtractionReport {
    pub fn count(&self, kind: ContentKind) -> usize {
        self.items.iter().filter(|i| i.kind == kind).count()
    }

    /// Pages that produced a text block (direct or OCR).
    pub fn text_pages(&self) -> usize {
        self.count(ContentKind::Text) + self.count(ContentKind::PageOcr)
    }
}

/// Extracts page-tagged content from PDFs.
pub struct DocumentExtractor {
    config: ExtractionConfig,
    tesseract: Tesseract,
}

impl DocumentExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        let tesseract = Tesseract::new(&config.ocr_language);
        Self { config, tesseract }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract all enabled content types. Images are written to `images_dir`.
    ///
    /// This runs external processes and blocks; call it from
    /// `spawn_blocking` in async contexts.
    pub fn extract(&self, pdf_path: &Path, images_dir: &Path) -> Result<ExtractionReport, ExtractionError> {
        let pages = page_count(pdf_path)?;
        info!("Extracting {} ({} pages)", pdf_path.display(), pages);

        let mut items = self.extract_text(pdf_path, pages)?;
        info!("Extracted text from {} pages", items.len());

        if self.config.tables {
            let tables = self.extract_tables(pdf_path, pages)?;
            info!("Extracted {} tables", tables.len());
            items.extend(tables);
        }

        if self.config.images {
            let images = extract_images(pdf_path, images_dir, &self.tesseract)?;
            info!("Processed {} images with OCR", images.len());
            items.extend(images);
        }

        Ok(ExtractionReport {
            page_count: pages,
            items,
        })
    }

    /// One text block per page that has any text.
    ///
    /// Pages whose text layer is sparse are OCRed, and the OCR text is kept
    /// when it has significantly more content (>20% more characters).
    pub fn extract_text(&self, pdf_path: &Path, pages: u32) -> Result<Vec<ContentItem>, ExtractionError> {
        let ocr_available = self.config.page_ocr && self.tesseract.is_available();
        let mut items = Vec::new();

        for page in 1..=pages {
            let text = page_text(pdf_path, page, false)?;

            let mut ocr_text = None;
            if ocr_available && needs_ocr(&text, self.config.min_chars_per_page) {
                match self.tesseract.ocr_pdf_page(pdf_path, page) {
                    Ok(recognized) => ocr_text = Some(recognized),
                    Err(e) => debug!("OCR failed for page {}: {}, using text layer", page, e),
                }
            }

            if let Some(item) = page_item(page, text, ocr_text) {
                if item.kind == ContentKind::PageOcr {
                    debug!("Page {} recovered by OCR", page);
                }
                items.push(item);
            }
        }

        Ok(items)
    }

    /// Markdown-rendered tables, numbered per page.
    pub fn extract_tables(&self, pdf_path: &Path, pages: u32) -> Result<Vec<ContentItem>, ExtractionError> {
        let mut items = Vec::new();
        for page in 1..=pages {
            let layout = page_text(pdf_path, page, true)?;
            for (i, table) in detect_tables(&layout).iter().enumerate() {
                let number = i as u32 + 1;
                items.push(ContentItem::table(page, number, table.to_markdown(number, page)));
            }
        }
        Ok(items)
    }
}

/// A text layer with fewer than `min_chars` non-whitespace characters is sparse.
fn needs_ocr(text: &str, min_chars: usize) -> bool {
    non_whitespace_chars(text) < min_chars
}

/// OCR wins only with more than 20% extra content.
fn ocr_improves(pdf_chars: usize, ocr_chars: usize) -> bool {
    ocr_chars > pdf_chars + pdf_chars / 5
}

/// The block a page contributes, if any.
fn page_item(page: u32, text: String, ocr_text: Option<String>) -> Option<ContentItem> {
    let pdf_chars = non_whitespace_chars(&text);
    if let Some(ocr_text) = ocr_text {
        if ocr_improves(pdf_chars, non_whitespace_chars(&ocr_text)) {
            return Some(ContentItem::page_ocr(page, ocr_text));
        }
    }
    (pdf_chars > 0).then(|| ContentItem::text(page, text))
}
