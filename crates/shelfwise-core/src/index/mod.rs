//! Semantic index abstraction.
//!
//! The [`SemanticIndex`] trait is the pipeline's only external
//! collaborator: a relevance-ordered nearest-neighbor search over the
//! catalog's tagged descriptions. Backends (the in-memory term-overlap
//! index here, a remote HTTP service in the application crate) plug in
//! behind it.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//! Retries, if any, belong to the implementation, never to the pipeline.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One search hit. `content` carries the record identifier as its leading
/// token, e.g. `"9780385121675 A horror novel about..."`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    pub content: String,
}

impl IndexHit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// The leading token of `content`, with surrounding quotes stripped.
    pub fn identifier(&self) -> Option<&str> {
        self.content
            .trim()
            .split_whitespace()
            .next()
            .map(|token| token.trim_matches('"'))
            .filter(|token| !token.is_empty())
    }
}

/// Relevance-ordered search over the catalog.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Return up to `k` hits, most relevant first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<IndexHit>>;
}
