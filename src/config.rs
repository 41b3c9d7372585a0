//! Configuration management for docqa.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional config file (TOML, YAML or JSON, chosen by extension), and
//! environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::embed::EmbeddingConfig;
use crate::llm::LlmConfig;

/// Name `prefer` searches for in the standard config locations.
const CONFIG_NAME: &str = "docqa";

/// Default subdirectory names under the data directory.
const INDEX_SUBDIR: &str = "index";
const OUTPUT_SUBDIR: &str = "extracted";

/// Look up an environment variable, treating empty values as unset.
pub(crate) fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

pub(crate) fn parse_bool(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1" || val.eq_ignore_ascii_case("yes")
}

/// What to pull out of a PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Detect tables in the layout text.
    pub tables: bool,
    /// OCR images embedded in pages.
    pub images: bool,
    /// OCR pages whose text layer is too sparse.
    pub page_ocr: bool,
    /// Pages with fewer non-whitespace characters than this are OCR candidates.
    pub min_chars_per_page: usize,
    /// Tesseract language code(s), e.g. "eng" or "eng+deu".
    pub ocr_language: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tables: true,
            images: true,
            page_ocr: true,
            min_chars_per_page: 20,
            ocr_language: "eng".to_string(),
        }
    }
}

impl ExtractionConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply overrides from `lookup` (the environment in practice).
    ///
    /// - `DOCQA_EXTRACT_TABLES`, `DOCQA_EXTRACT_IMAGES`, `DOCQA_PAGE_OCR`: "true"/"false"
    /// - `DOCQA_MIN_CHARS_PER_PAGE`
    /// - `DOCQA_OCR_LANGUAGE`
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("DOCQA_EXTRACT_TABLES") {
            self.tables = parse_bool(&val);
        }
        if let Some(val) = lookup("DOCQA_EXTRACT_IMAGES") {
            self.images = parse_bool(&val);
        }
        if let Some(val) = lookup("DOCQA_PAGE_OCR") {
            self.page_ocr = parse_bool(&val);
        }
        if let Some(n) = lookup("DOCQA_MIN_CHARS_PER_PAGE").and_then(|v| v.parse().ok()) {
            self.min_chars_per_page = n;
        }
        if let Some(val) = lookup("DOCQA_OCR_LANGUAGE") {
            self.ocr_language = val;
        }
        self
    }
}

/// Text splitter parameters, in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(n) = lookup("DOCQA_CHUNK_SIZE").and_then(|v| v.parse().ok()) {
            self.chunk_size = n;
        }
        if let Some(n) = lookup("DOCQA_CHUNK_OVERLAP").and_then(|v| v.parse().ok()) {
            self.chunk_overlap = n;
        }
        self
    }
}

/// Query-time retrieval parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of passages retrieved per question.
    pub top_k: usize,
    /// Upper bound on the context handed to the LLM, in bytes.
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_context_chars: 12000,
        }
    }
}

impl RetrievalConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(n) = lookup("DOCQA_TOP_K").and_then(|v| v.parse().ok()) {
            self.top_k = n;
        }
        if let Some(n) = lookup("DOCQA_MAX_CONTEXT_CHARS").and_then(|v| v.parse().ok()) {
            self.max_context_chars = n;
        }
        self
    }
}

/// Web server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address: a port, a host, or host:port.
    pub bind: String,
    /// Largest accepted upload, in megabytes.
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
            max_upload_mb: 200,
        }
    }
}

impl ServerConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("DOCQA_BIND") {
            self.bind = val;
        }
        if let Some(n) = lookup("DOCQA_MAX_UPLOAD_MB").and_then(|v| v.parse().ok()) {
            self.max_upload_mb = n;
        }
        self
    }
}

/// Resolved paths.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Where the persisted vector index lives.
    pub index_dir: PathBuf,
    /// Where extracted content and images are written.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        // Platform data dir, falling back to the home dir, then the CWD
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docqa");
        Self::with_data_dir(data_dir)
    }
}

impl Settings {
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            index_dir: data_dir.join(INDEX_SUBDIR),
            output_dir: data_dir.join(OUTPUT_SUBDIR),
            data_dir,
        }
    }

    /// Ensure the data, index and output directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.index_dir)?;
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Index directory (defaults to `<data_dir>/index`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_dir: Option<String>,
    /// Extraction output directory (defaults to `<data_dir>/extracted`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "ExtractionConfig::is_default")]
    pub extraction: ExtractionConfig,
    #[serde(default, skip_serializing_if = "ChunkingConfig::is_default")]
    pub chunking: ChunkingConfig,
    #[serde(default, skip_serializing_if = "EmbeddingConfig::is_default")]
    pub embedding: EmbeddingConfig,
    #[serde(default, skip_serializing_if = "LlmConfig::is_default")]
    pub llm: LlmConfig,
    #[serde(default, skip_serializing_if = "RetrievalConfig::is_default")]
    pub retrieval: RetrievalConfig,
    #[serde(default, skip_serializing_if = "ServerConfig::is_default")]
    pub server: ServerConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Defaults with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides to every section. Environment wins over the file.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(env_var)
    }

    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String> + Copy) -> Self {
        self.extraction = self.extraction.with_overrides_from(lookup);
        self.chunking = self.chunking.with_overrides_from(lookup);
        self.embedding = self.embedding.with_overrides_from(lookup);
        self.llm = self.llm.with_overrides_from(lookup);
        self.retrieval = self.retrieval.with_overrides_from(lookup);
        self.server = self.server.with_overrides_from(lookup);
        self
    }

    /// Parse config text, choosing the format from a file extension.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => {
                toml::from_str(contents).map_err(|e| format!("Failed to parse TOML config: {}", e))
            }
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Load configuration from a specific file path.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    /// Find a `docqa` config file in the standard locations via `prefer`.
    pub async fn discover() -> Option<PathBuf> {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => pref_config.source_path().map(|p| p.to_path_buf()),
            Err(_) => None,
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configured paths to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            *settings = Settings::with_data_dir(self.resolve_path(data_dir, base_dir));
        }
        if let Some(ref index_dir) = self.index_dir {
            settings.index_dir = self.resolve_path(index_dir, base_dir);
        }
        if let Some(ref output_dir) = self.output_dir {
            settings.output_dir = self.resolve_path(output_dir, base_dir);
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides discovery).
    pub config_path: Option<PathBuf>,
    /// Resolve relative paths from the CWD instead of the config file's directory.
    pub use_cwd: bool,
}

/// Load settings and config.
///
/// An explicit `--config` path that fails to load is an error; a discovered
/// file that fails to parse is logged and ignored.
pub async fn load_settings(options: LoadOptions) -> Result<(Settings, Config), String> {
    let config = if let Some(ref path) = options.config_path {
        Config::load_from_path(path).await?
    } else if let Some(path) = Config::discover().await {
        tracing::debug!("Using config file: {}", path.display());
        match Config::load_from_path(&path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Config::default_with_env()
            }
        }
    } else {
        Config::default_with_env()
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd
    } else {
        config.base_dir().unwrap_or(cwd)
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    // DOCQA_* path overrides take precedence over the file
    if let Some(dir) = env_var("DOCQA_DATA_DIR") {
        let index_dir = config.index_dir.as_ref().map(|_| settings.index_dir.clone());
        let output_dir = config.output_dir.as_ref().map(|_| settings.output_dir.clone());
        settings = Settings::with_data_dir(config.resolve_path(&dir, &base_dir));
        if let Some(index_dir) = index_dir {
            settings.index_dir = index_dir;
        }
        if let Some(output_dir) = output_dir {
            settings.output_dir = output_dir;
        }
    }
    if let Some(dir) = env_var("DOCQA_INDEX_DIR") {
        settings.index_dir = config.resolve_path(&dir, &base_dir);
    }
    if let Some(dir) = env_var("DOCQA_OUTPUT_DIR") {
        settings.output_dir = config.resolve_path(&dir, &base_dir);
    }

    Ok((settings, config))
}
