//! Remote semantic index over HTTP.
//!
//! [`HttpIndex`] forwards [`SemanticIndex::search`] to a vector-search
//! service:
//!
//! ```text
//! POST {url}/search        {"query": "...", "k": 250}
//! 200 OK                   {"results": [{"content": "9780385121675 A horror novel..."}]}
//! ```
//!
//! Any transport error or non-2xx status is a hard failure. There are no
//! retries here; a failed search fails the request.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use shelfwise_core::index::{IndexHit, SemanticIndex};

use crate::config::IndexConfig;

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<IndexHit>,
}

/// Client for a remote search service.
pub struct HttpIndex {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIndex {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/search", base_url.trim_end_matches('/')),
        })
    }

    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        let url = match config.url.as_deref() {
            Some(url) if !url.trim().is_empty() => url.trim(),
            _ => bail!("index.url must be specified when provider is 'http'"),
        };
        Self::new(url, Duration::from_secs(config.timeout_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SemanticIndex for HttpIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<IndexHit>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SearchRequest { query, k })
            .send()
            .await
            .with_context(|| format!("Search request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Search service error {}: {}", status, body);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search service response")?;
        debug!(k, hits = parsed.results.len(), "remote index search");
        Ok(parsed.results)
    }
}
