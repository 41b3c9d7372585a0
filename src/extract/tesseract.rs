//! Tesseract OCR via the command-line binary.

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use tempfile::TempDir;
use tracing::debug;

use super::pdf::render_page;
use super::tools::{check_binary, handle_cmd_output, ExtractionError};

/// Tesseract OCR engine.
#[derive(Debug, Clone)]
pub struct Tesseract {
    language: String,
}

impl Default for Tesseract {
    fn default() -> Self {
        Self::new("eng")
    }
}

impl Tesseract {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    pub fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else if !check_binary("pdftoppm") {
            "pdftoppm not installed. Install with: apt install poppler-utils".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    /// Run Tesseract on an image file.
    pub fn ocr_image(&self, image_path: &Path) -> Result<String, ExtractionError> {
        let start = Instant::now();
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        let text = handle_cmd_output(output, "tesseract (install tesseract-ocr)", "tesseract failed")?;
        debug!(
            "OCR of {} took {}ms",
            image_path.display(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }

    /// Render a single PDF page and OCR it.
    pub fn ocr_pdf_page(&self, pdf_path: &Path, page: u32) -> Result<String, ExtractionError> {
        let temp_dir = TempDir::new()?;
        let image_path = render_page(pdf_path, page, temp_dir.path())?;
        self.ocr_image(&image_path)
    }
}
