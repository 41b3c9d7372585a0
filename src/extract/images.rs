//! Embedded image extraction and OCR.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tempfile::TempDir;
use tracing::{debug, warn};

use super::tesseract::Tesseract;
use super::tools::{check_cmd_status, ExtractionError};
use crate::models::ContentItem;

/// `pdfimages -p` names files `<prefix>-<page>-<counter>.<ext>`.
static IMAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d+)-(\d+)\.([A-Za-z0-9]+)$").unwrap());

/// Names of images written by an earlier extraction.
static SAVED_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^page\d+_img\d+\.png$").unwrap());

/// An image pulled out of the PDF, before OCR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub page: u32,
    /// 1-based position of the image on its page.
    pub index: u32,
    pub path: PathBuf,
}

/// Parse `(page, counter)` from a `pdfimages -p` output file name.
fn parse_image_name(name: &str) -> Option<(u32, u32)> {
    let caps = IMAGE_NAME.captures(name)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Dump every embedded image as PNG into `dir`, grouped by page.
fn dump_images(pdf_path: &Path, dir: &Path) -> Result<Vec<PageImage>, ExtractionError> {
    let status = Command::new("pdfimages")
        .args(["-png", "-p"])
        .arg(pdf_path)
        .arg(dir.join("img"))
        .status();

    check_cmd_status(
        status,
        "pdfimages (install poppler-utils)",
        "pdfimages failed to extract images",
    )?;

    let mut by_page: BTreeMap<u32, Vec<(u32, PathBuf)>> = BTreeMap::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match parse_image_name(name) {
            Some((page, counter)) => by_page.entry(page).or_default().push((counter, path)),
            None => debug!("Ignoring unexpected pdfimages output: {}", name),
        }
    }

    let mut images = Vec::new();
    for (page, mut files) in by_page {
        files.sort();
        for (i, (_, path)) in files.into_iter().enumerate() {
            images.push(PageImage {
                page,
                index: i as u32 + 1,
                path,
            });
        }
    }
    Ok(images)
}

/// Remove `page{p}_img{i}.png` files left by a previous document.
fn clear_saved_images(images_dir: &Path) -> Result<usize, ExtractionError> {
    let mut removed = 0;
    for entry in std::fs::read_dir(images_dir)? {
        let path = entry?.path();
        let stale = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| SAVED_IMAGE.is_match(name));
        if stale && path.is_file() {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Extract embedded images into `images_dir` and OCR each one.
///
/// Images are saved as `page{p}_img{i}.png`. Images whose OCR text is blank
/// are dropped. A failure on a single image is logged and skipped.
pub fn extract_images(
    pdf_path: &Path,
    images_dir: &Path,
    tesseract: &Tesseract,
) -> Result<Vec<ContentItem>, ExtractionError> {
    std::fs::create_dir_all(images_dir)?;
    let removed = clear_saved_images(images_dir)?;
    if removed > 0 {
        debug!("Removed {} images from a previous extraction", removed);
    }
    let temp_dir = TempDir::new()?;
    let images = dump_images(pdf_path, temp_dir.path())?;
    debug!("pdfimages produced {} images", images.len());

    let mut items = Vec::new();
    for image in images {
        let target = images_dir.join(format!("page{}_img{}.png", image.page, image.index));
        let ocr = std::fs::copy(&image.path, &target)
            .map_err(ExtractionError::from)
            .and_then(|_| tesseract.ocr_image(&target));

        match ocr {
            Ok(text) if !text.trim().is_empty() => {
                items.push(ContentItem::image_ocr(image.page, target, &text));
            }
            Ok(_) => debug!("No text found in {}", target.display()),
            Err(e) => warn!(
                "Error processing image {} on page {}: {}",
                image.index, image.page, e
            ),
        }
    }

    Ok(items)
}
