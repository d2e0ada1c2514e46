//! In-memory [`SemanticIndex`] for tests and offline use.
//!
//! Relevance is the number of query terms found in a document, a crude
//! stand-in for embedding similarity. Every document is returned (it is a
//! nearest-neighbor search, not a filter), ordered by score descending
//! with insertion order breaking ties, so results are deterministic.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::ItemRecord;

use super::{IndexHit, SemanticIndex};

struct IndexedDoc {
    content: String,
    lowered: String,
}

/// Term-overlap index over tagged descriptions.
#[derive(Default)]
pub struct InMemoryIndex {
    docs: Vec<IndexedDoc>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index each record's tagged description (`"<id> <description>"`).
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ItemRecord>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.add(record.tagged_description());
        }
        index
    }

    pub fn add(&mut self, content: impl Into<String>) {
        let content = content.into();
        let lowered = content.to_lowercase();
        self.docs.push(IndexedDoc { content, lowered });
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[async_trait]
impl SemanticIndex for InMemoryIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<IndexHit>> {
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();

        let mut scored: Vec<(usize, &IndexedDoc)> = self
            .docs
            .iter()
            .map(|doc| {
                let matches = terms.iter().filter(|t| doc.lowered.contains(*t)).count();
                (matches, doc)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(_, doc)| IndexHit::new(doc.content.clone()))
            .collect())
    }
}
