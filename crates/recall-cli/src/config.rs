//! CLI configuration file support
//!
//! Loads configuration from ~/.config/recall/config.toml

use anyhow::{Context, Result};
use recall_ai::llm::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL};
use recall_ai::{EmbeddingConfig, LlmRetryConfig};
use recall_memory::MemoryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Memory system settings
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub model: String,
    pub base_url: String,
    /// Used when neither `--api-key` nor `OPENAI_API_KEY` is set
    pub api_key: Option<String>,
    pub embedding: EmbeddingConfig,
    pub retry: LlmRetryConfig,
    /// Width of the offline hash embedder
    pub offline_dimension: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            embedding: EmbeddingConfig::default(),
            retry: LlmRetryConfig::default(),
            offline_dimension: 256,
        }
    }
}

impl CliConfig {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields the defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.memory.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("recall").join("config.toml"))
    }
}
