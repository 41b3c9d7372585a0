//! Indexing command.

use std::path::Path;

use console::style;

use crate::cli::icons::{dim_arrow, info, success};
use crate::cli::progress::IndexProgress;
use crate::config::Config;
use crate::pipeline::IndexingPipeline;
use crate::utils::format_size;

/// Extract, chunk and embed a PDF, then persist the index.
pub async fn cmd_index(
    config: &Config,
    pdf: &Path,
    output_dir: &Path,
    index_dir: &Path,
) -> anyhow::Result<()> {
    let pipeline = IndexingPipeline::from_config(config)?;
    let fingerprint = pipeline.embedder().fingerprint();

    println!("{} Indexing {}", info(), pdf.display());
    println!("  {} Embeddings: {}", dim_arrow(), fingerprint);

    let progress = IndexProgress::new();
    let result = pipeline
        .run(pdf, output_dir, index_dir, &|p| progress.update(p))
        .await;
    progress.finish();
    let summary = result?;

    println!(
        "{} Indexed {} ({} pages) into {} passages",
        success(),
        style(&summary.source.file_name).bold(),
        summary.page_count,
        summary.passages
    );
    println!(
        "  text: {}  page OCR: {}  tables: {}  image OCR: {}",
        summary.text_items, summary.page_ocr_items, summary.table_items, summary.image_items
    );
    if let Some(path) = summary.index_path {
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        println!("  {} {} ({})", dim_arrow(), path.display(), format_size(size));
    }
    Ok(())
}
