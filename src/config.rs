//! TOML configuration parsing and validation.
//!
//! Every setting has a default, so a missing config file is not an error:
//! [`load_config`] falls back to [`Config::default`]. A file that exists but
//! fails to parse or validate is rejected.
//!
//! ```toml
//! [corpus]
//! root = "./csla-examples"
//! include_globs = ["**/*.cs", "**/*.md"]
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! ```

use anyhow::{bail, Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Where the example files live and which of them are eligible.
#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("./csla-examples")
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.cs".to_string(), "**/*.md".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Tuning for the embedding API client. Endpoint, key, and model come from
/// the environment (see [`crate::embed_cmd::EmbedSettings`]).
#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Replace the corpus root, e.g. from the `--examples-path` flag.
    pub fn with_corpus_root(mut self, root: Option<PathBuf>) -> Self {
        if let Some(root) = root {
            self.corpus.root = root;
        }
        self
    }
}

/// Load and validate the config file at `path`, or the defaults if it does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.corpus.include_globs.is_empty() {
        bail!("corpus.include_globs must not be empty");
    }
    for pattern in config
        .corpus
        .include_globs
        .iter()
        .chain(&config.corpus.exclude_globs)
    {
        Glob::new(pattern).with_context(|| format!("invalid glob in corpus config: {}", pattern))?;
    }

    if config.server.bind.trim().is_empty() {
        bail!("server.bind must not be empty");
    }

    if config.embedding.timeout_secs == 0 {
        bail!("embedding.timeout_secs must be > 0");
    }

    Ok(())
}
