//! TOML configuration loading and validation.
//!
//! Every section is optional; a missing config file yields the defaults.
//! After the file is parsed, a few environment variables override it and
//! the result is validated.
//!
//! # Lookup order
//!
//! 1. `--config <path>` on the command line.
//! 2. `RAGKB_CONFIG`.
//! 3. `~/.ragkb/config.toml`.
//!
//! # Environment overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `OLLAMA_HOST` | `embedding.url` (`http://host:port` or bare `host[:port]`) |
//! | `OLLAMA_TOKEN` | `embedding.token` |
//! | `RAGKB_LOG_LEVEL` | `log.level` |

use anyhow::{bail, Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use ragkb_core::chunk::{ChunkOptions, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

pub const DEFAULT_EMBED_MODEL: &str = "mxbai-embed-large";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_PORT: u16 = 11434;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub db: DbConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DbConfig {
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_home_dir().join("knowledge.db"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub url: String,
    pub model: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_EMBED_MODEL.to_string(),
            token: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    pub fn options(&self) -> ChunkOptions {
        ChunkOptions {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: i64,
    pub include_globs: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            include_globs: default_include_globs(),
        }
    }
}

pub fn default_include_globs() -> Vec<String> {
    ["*.txt", "*.md", "*.go", "*.py", "*.js", "*.java"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `~/.ragkb`, or `./.ragkb` when no home directory is known.
pub fn default_home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ragkb")
}

/// Resolve which config file to read.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Ok(p) = std::env::var("RAGKB_CONFIG") {
        if !p.is_empty() {
            return PathBuf::from(p);
        }
    }
    default_home_dir().join("config.toml")
}

/// Load, override from the environment, and validate.
///
/// A missing file is not an error; an unreadable or malformed one is.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?
    } else {
        Config::default()
    };

    config.apply_env(|key| std::env::var(key).ok());
    config.db.path = expand_tilde(&config.db.path);
    config.validate()?;
    Ok(config)
}

/// Parse TOML text without touching the environment.
pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

impl Config {
    /// Apply environment overrides through `lookup` (injectable for tests).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("OLLAMA_HOST").filter(|v| !v.is_empty()) {
            self.embedding.url = normalize_host(&host);
        }
        if let Some(token) = lookup("OLLAMA_TOKEN").filter(|v| !v.is_empty()) {
            self.embedding.token = Some(token);
        }
        if let Some(level) = lookup("RAGKB_LOG_LEVEL").filter(|v| !v.is_empty()) {
            self.log.level = level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            bail!("chunking.chunk_size must be > 0");
        }

        if self.retrieval.top_k < 1 {
            bail!("retrieval.top_k must be >= 1");
        }

        for pattern in &self.retrieval.include_globs {
            Glob::new(pattern)
                .with_context(|| format!("retrieval.include_globs: invalid pattern '{}'", pattern))?;
        }

        if self.embedding.model.trim().is_empty() {
            bail!("embedding.model must not be empty");
        }

        if self.embedding.timeout_secs == 0 {
            bail!("embedding.timeout_secs must be > 0");
        }

        match self.embedding.provider.as_str() {
            "ollama" | "openai" => {}
            other => bail!(
                "Unknown embedding provider: '{}'. Must be ollama or openai.",
                other
            ),
        }

        match self.log.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "warning" | "error" => {}
            other => bail!(
                "Unknown log level: '{}'. Must be trace, debug, info, warn, or error.",
                other
            ),
        }

        Ok(())
    }
}

/// Accept `http://host:port`, `host:port`, or a bare `host`.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else if host.contains(':') {
        format!("http://{}", host)
    } else {
        format!("http://{}:{}", host, DEFAULT_OLLAMA_PORT)
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
