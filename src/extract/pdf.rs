//! Poppler wrappers for page counts, text layers and page rendering.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::tools::{check_cmd_status, handle_cmd_output, ExtractionError};

const PDFINFO: &str = "pdfinfo (install poppler-utils)";
const PDFTOTEXT: &str = "pdftotext (install poppler-utils)";
const PDFTOPPM: &str = "pdftoppm (install poppler-utils)";

/// Get the page count of a PDF.
pub fn page_count(file_path: &Path) -> Result<u32, ExtractionError> {
    let output = Command::new("pdfinfo").arg(file_path).output();
    let stdout = handle_cmd_output(output, PDFINFO, "pdfinfo failed")?;
    parse_page_count(&stdout).ok_or_else(|| {
        ExtractionError::ExtractionFailed(format!(
            "pdfinfo reported no page count for {}",
            file_path.display()
        ))
    })
}

fn parse_page_count(pdfinfo_output: &str) -> Option<u32> {
    pdfinfo_output
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

/// Run pdftotext on a single page of a PDF file.
///
/// With `layout` set, column positions are preserved, which is what table
/// detection works on.
pub fn page_text(file_path: &Path, page: u32, layout: bool) -> Result<String, ExtractionError> {
    let page_str = page.to_string();
    let mut cmd = Command::new("pdftotext");
    if layout {
        cmd.arg("-layout");
    }
    let output = cmd
        .args(["-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
        .arg(file_path)
        .arg("-") // Output to stdout
        .output();

    handle_cmd_output(
        output,
        PDFTOTEXT,
        &format!("pdftotext failed on page {}", page),
    )
}

/// Render one page to a 300 DPI PNG inside `output_dir`.
pub fn render_page(file_path: &Path, page: u32, output_dir: &Path) -> Result<PathBuf, ExtractionError> {
    let page_str = page.to_string();
    let status = Command::new("pdftoppm")
        .args(["-png", "-r", "300", "-f", &page_str, "-l", &page_str])
        .arg(file_path)
        .arg(output_dir.join("page"))
        .status();

    check_cmd_status(
        status,
        PDFTOPPM,
        &format!("pdftoppm failed to convert page {}", page),
    )?;

    find_page_image(output_dir, page).ok_or_else(|| {
        ExtractionError::ExtractionFailed(format!("No image generated for page {}", page))
    })
}

/// Find the image file for a specific page number.
fn find_page_image(dir: &Path, page: u32) -> Option<PathBuf> {
    // pdftoppm pads the page number to the width of the page count:
    // page-1.png, page-01.png, page-001.png, ...
    (1..=4)
        .map(|digits| dir.join(format!("page-{:0width$}.png", page, width = digits)))
        .find(|path| path.exists())
}

/// Whether `bytes` start like a PDF document.
pub fn is_pdf(bytes: &[u8]) -> bool {
    infer::get(bytes).is_some_and(|kind| kind.mime_type() == "application/pdf")
}

/// Check a file's magic bytes before handing it to Poppler.
pub fn ensure_pdf(file_path: &Path) -> Result<(), ExtractionError> {
    let mut header = [0u8; 1024];
    let n = std::io::Read::read(&mut std::fs::File::open(file_path)?, &mut header)?;
    if is_pdf(&header[..n]) {
        Ok(())
    } else {
        Err(ExtractionError::NotAPdf(file_path.display().to_string()))
    }
}
