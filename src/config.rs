use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use shelfwise_core::pipeline::PipelineParams;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_candidate_k")]
    pub candidate_k: usize,
    #[serde(default = "default_final_k")]
    pub final_k: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_k: default_candidate_k(),
            final_k: default_final_k(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_candidate_k() -> usize {
    50
}
fn default_final_k() -> usize {
    16
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl RetrievalConfig {
    /// Pipeline sizes, with `final_k` optionally overridden per request.
    /// `candidate_k` grows to at least the requested result size.
    pub fn pipeline_params(&self, limit: Option<usize>) -> PipelineParams {
        let final_k = limit.unwrap_or(self.final_k);
        PipelineParams {
            candidate_k: self.candidate_k.max(final_k),
            final_k,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_index_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            url: None,
            timeout_secs: default_index_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}
fn default_index_timeout_secs() -> u64 {
    10
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate retrieval
    if config.retrieval.candidate_k < 1 {
        anyhow::bail!("retrieval.candidate_k must be >= 1");
    }
    if config.retrieval.final_k < 1 {
        anyhow::bail!("retrieval.final_k must be >= 1");
    }
    if config.retrieval.final_k > config.retrieval.candidate_k {
        anyhow::bail!(
            "retrieval.final_k ({}) must be <= retrieval.candidate_k ({})",
            config.retrieval.final_k,
            config.retrieval.candidate_k
        );
    }
    if config.retrieval.timeout_secs < 1 {
        anyhow::bail!("retrieval.timeout_secs must be >= 1");
    }

    // Validate index
    match config.index.provider.as_str() {
        "memory" => {}
        "http" => {
            let url = config.index.url.as_deref().unwrap_or("").trim();
            if url.is_empty() {
                anyhow::bail!("index.url must be specified when provider is 'http'");
            }
            if config.index.timeout_secs < 1 {
                anyhow::bail!("index.timeout_secs must be >= 1");
            }
        }
        other => anyhow::bail!(
            "Unknown index provider: '{}'. Must be memory or http.",
            other
        ),
    }

    Ok(())
}
