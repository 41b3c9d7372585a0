//! Extraction command.

use std::path::Path;
use std::sync::Arc;

use console::style;

use crate::cli::icons::{dim_arrow, info, success};
use crate::cli::progress::spinner;
use crate::config::Config;
use crate::extract::{DocumentExtractor, ExtractionReport, ALL_CONTENT_JSON, ALL_CONTENT_TXT};
use crate::models::ContentKind;
use crate::pipeline::extract_document;

/// Extract a PDF and write the content dump.
pub async fn cmd_extract(config: &Config, pdf: &Path, output_dir: &Path) -> anyhow::Result<()> {
    println!("{} Extracting {}", info(), pdf.display());

    let pb = spinner("Extracting text, tables and images...");

    let extractor = Arc::new(DocumentExtractor::new(config.extraction.clone()));
    let result = extract_document(extractor, pdf, output_dir).await;
    pb.finish_and_clear();
    let report = result?;

    print_report(&report);
    println!(
        "  {} {}",
        dim_arrow(),
        output_dir.join(ALL_CONTENT_JSON).display()
    );
    println!(
        "  {} {}",
        dim_arrow(),
        output_dir.join(ALL_CONTENT_TXT).display()
    );
    Ok(())
}

/// Print per-kind counts of an extraction.
fn print_report(report: &ExtractionReport) {
    println!(
        "{} Extracted {} content blocks from {} pages",
        success(),
        report.items.len(),
        report.page_count
    );
    for (label, kind) in [
        ("Text pages", ContentKind::Text),
        ("OCR'd pages", ContentKind::PageOcr),
        ("Tables", ContentKind::Table),
        ("Image OCR", ContentKind::ImageOcr),
    ] {
        println!("  {:<15} {}", label, style(report.count(kind)).bold());
    }
}
