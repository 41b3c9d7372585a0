//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod ask;
mod check;
mod config_cmd;
mod extract;
mod index;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions about a PDF and get answers with page citations")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text, tables and image OCR from a PDF without indexing
    Extract {
        /// PDF file to extract
        pdf: PathBuf,
        /// Output directory (defaults to the configured output dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract, chunk and embed a PDF into a persisted vector index
    Index {
        /// PDF file to index
        pdf: PathBuf,
        /// Directory for extracted content
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Index directory (defaults to the configured index dir)
        #[arg(long)]
        index: Option<PathBuf>,
        /// Skip table detection
        #[arg(long)]
        no_tables: bool,
        /// Skip OCR of embedded images
        #[arg(long)]
        no_images: bool,
    },

    /// Ask a question about the indexed document (interactive when no question is given)
    Ask {
        /// Question to ask
        question: Option<String>,
        /// Index directory (defaults to the configured index dir)
        #[arg(long)]
        index: Option<PathBuf>,
        /// Number of passages to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Start the web interface
    Serve {
        /// Address to bind to (port, host, or host:port)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Check external tools, the embedding service and the LLM
    Check,

    /// Show the effective configuration
    Config,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let (settings, mut config) = load_settings(options).await.map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Extract { pdf, output } => {
            let output = output.unwrap_or_else(|| settings.output_dir.clone());
            extract::cmd_extract(&config, &pdf, &output).await
        }
        Commands::Index {
            pdf,
            output,
            index,
            no_tables,
            no_images,
        } => {
            if no_tables {
                config.extraction.tables = false;
            }
            if no_images {
                config.extraction.images = false;
            }
            let output = output.unwrap_or_else(|| settings.output_dir.clone());
            let index = index.unwrap_or_else(|| settings.index_dir.clone());
            index::cmd_index(&config, &pdf, &output, &index).await
        }
        Commands::Ask {
            question,
            index,
            top_k,
        } => {
            if let Some(k) = top_k {
                config.retrieval.top_k = k;
            }
            let index = index.unwrap_or_else(|| settings.index_dir.clone());
            ask::cmd_ask(&config, &index, question.as_deref()).await
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            serve::cmd_serve(&settings, &config, &bind).await
        }
        Commands::Check => check::cmd_check(&settings, &config).await,
        Commands::Config => config_cmd::cmd_config_show(&settings, &config),
    }
}
