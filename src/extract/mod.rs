//! Text, table and image extraction from PDF files.
//!
//! Extraction shells out to external tools:
//! - `pdfinfo` / `pdftotext` (Poppler) for page counts and text layers
//! - `pdfimages` (Poppler) for embedded images
//! - `pdftoppm` (Poppler) for rendering sparse pages before OCR
//! - Tesseract for OCR of images and rendered pages
//!
//! Every extracted block is tagged with the page it came from.

mod extractor;
mod images;
mod output;
mod pdf;
mod tables;
mod tesseract;
mod tools;

pub use extractor::{DocumentExtractor, ExtractionReport};
pub use output::{save_all_content, ALL_CONTENT_JSON, ALL_CONTENT_TXT, IMAGES_SUBDIR};
pub use pdf::{ensure_pdf, is_pdf, page_count, page_text, render_page};
pub use tables::{detect_tables, Table};
pub use tesseract::Tesseract;
pub use tools::{check_binary, check_tools, ExtractionError};
