//! Environment check command.

use console::style;

use crate::cli::icons::{error, success, warn};
use crate::config::{Config, Settings};
use crate::embed::create_embedder;
use crate::extract::{check_tools, Tesseract};
use crate::index::VectorIndex;
use crate::llm::LlmClient;

/// Report external tools, the embedder, the LLM and the persisted index.
pub async fn cmd_check(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("docqa Status").bold());
    println!("{}", "-".repeat(50));

    println!("\n{}", style("Extraction Tools:").cyan());
    let mut all_found = true;
    for (tool, available) in check_tools() {
        let status = if available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    let tesseract = Tesseract::new(&config.extraction.ocr_language);
    if !tesseract.is_available() {
        println!(
            "                  {}",
            style(tesseract.availability_hint()).dim()
        );
    }
    if !all_found {
        println!(
            "\n  {} Install poppler-utils and tesseract-ocr for full extraction",
            warn()
        );
    }

    println!("\n{}", style("Embeddings:").cyan());
    match create_embedder(&config.embedding) {
        Ok(embedder) => {
            let fingerprint = embedder.fingerprint();
            match embedder.embed_query("connectivity check").await {
                Ok(_) => println!("  {:<15} {} {}", "Embedder", style("✓ ok").green(), fingerprint),
                Err(e) => println!("  {:<15} {} {}", "Embedder", style("✗").red(), e),
            }
        }
        Err(e) => println!("  {:<15} {} {}", "Embedder", style("✗").red(), e),
    }

    println!("\n{}", style("LLM:").cyan());
    let llm = LlmClient::new(config.llm.clone())?;
    let status = if llm.is_available().await {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!(
        "  {:<15} {} ({} at {})",
        "LLM",
        status,
        config.llm.model,
        config.llm.base_url()
    );
    if config.llm.api_key.is_none() && !config.llm.is_local() {
        println!("                  {}", style("Set GROQ_API_KEY in .env").dim());
    }

    println!("\n{}", style("Index:").cyan());
    if VectorIndex::exists(&settings.index_dir) {
        match VectorIndex::load(&settings.index_dir) {
            Ok(index) => println!(
                "  {} {} ({} passages, {})",
                success(),
                index.meta.source.file_name,
                index.len(),
                index.meta.embedding
            ),
            Err(e) => println!("  {} {}", error(), e),
        }
    } else {
        println!(
            "  {} No index at {}",
            warn(),
            settings.index_dir.display()
        );
    }

    println!();
    Ok(())
}
