//! Configuration display command.

use console::style;

use crate::cli::icons::{dim_arrow, warn};
use crate::config::{Config, Settings};

/// Print the effective configuration (file + environment) and resolved paths.
pub fn cmd_config_show(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => println!("{} Config file: {}", dim_arrow(), path.display()),
        None => println!("{} No config file found, using defaults", warn()),
    }
    println!("{} Data dir:    {}", dim_arrow(), settings.data_dir.display());
    println!("{} Index dir:   {}", dim_arrow(), settings.index_dir.display());
    println!("{} Output dir:  {}", dim_arrow(), settings.output_dir.display());

    let json = serde_json::to_string_pretty(&EffectiveConfig::from(config))?;
    println!("\n{}", style("Effective configuration:").bold());
    println!("{}", json);
    Ok(())
}

/// Every section, including defaults, with secrets reduced to whether they are set.
#[derive(serde::Serialize)]
struct EffectiveConfig<'a> {
    extraction: &'a crate::config::ExtractionConfig,
    chunking: &'a crate::config::ChunkingConfig,
    embedding: serde_json::Value,
    llm: serde_json::Value,
    retrieval: &'a crate::config::RetrievalConfig,
    server: &'a crate::config::ServerConfig,
}

impl<'a> From<&'a Config> for EffectiveConfig<'a> {
    fn from(config: &'a Config) -> Self {
        let mut embedding = serde_json::to_value(&config.embedding).unwrap_or_default();
        mask_secret(&mut embedding, config.embedding.api_key.is_some());
        let mut llm = serde_json::to_value(&config.llm).unwrap_or_default();
        mask_secret(&mut llm, config.llm.api_key.is_some());

        Self {
            extraction: &config.extraction,
            chunking: &config.chunking,
            embedding,
            llm,
            retrieval: &config.retrieval,
            server: &config.server,
        }
    }
}

fn mask_secret(section: &mut serde_json::Value, is_set: bool) {
    if let Some(obj) = section.as_object_mut() {
        let shown = if is_set { "(set)" } else { "(not set)" };
        obj.insert("api_key".to_string(), serde_json::Value::from(shown));
    }
}
