//! Semantic narrowing: intersect index relevance order with the pre-filtered set.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::index::SemanticIndex;
use crate::models::ItemRecord;

/// Upper bound on how many hits are requested from the index.
pub const MAX_SEARCH_BREADTH: usize = 400;

/// Hits requested for a narrowing to `k`: over-fetch by 5x to survive the
/// membership intersection, capped at [`MAX_SEARCH_BREADTH`].
pub fn search_breadth(k: usize) -> usize {
    k.saturating_mul(5).min(MAX_SEARCH_BREADTH)
}

/// Narrow `candidates` to at most `k` records in index relevance order.
///
/// When there are already `k` or fewer candidates the index is not called
/// and `candidates` come back unchanged. A `k` of zero yields nothing
/// without a search. Otherwise the index hits are
/// filtered down to identifiers present in `candidates`, keeping the
/// index's order, stopping at `k`. Fewer than `k` matches is not an error.
///
/// # Errors
///
/// Fails only if the index search itself fails.
pub async fn narrow<'a, I>(
    query: &str,
    candidates: Vec<&'a ItemRecord>,
    index: &I,
    k: usize,
) -> Result<Vec<&'a ItemRecord>>
where
    I: SemanticIndex + ?Sized,
{
    if k == 0 {
        debug!(candidates = candidates.len(), "narrowing to zero records");
        return Ok(Vec::new());
    }
    if candidates.len() <= k {
        debug!(candidates = candidates.len(), k, "narrowing skipped");
        return Ok(candidates);
    }

    let breadth = search_breadth(k);
    let hits = index
        .search(query, breadth)
        .await
        .with_context(|| format!("Semantic index search failed (k={})", breadth))?;

    let by_id: HashMap<&str, &'a ItemRecord> =
        candidates.iter().map(|&r| (r.id.as_str(), r)).collect();

    let mut seen = HashSet::new();
    let mut narrowed = Vec::with_capacity(k);
    for id in hits.iter().filter_map(|hit| hit.identifier()) {
        if let Some(&record) = by_id.get(id) {
            if seen.insert(id) {
                narrowed.push(record);
            }
            if narrowed.len() >= k {
                break;
            }
        }
    }

    debug!(
        candidates = candidates.len(),
        hits = hits.len(),
        after = narrowed.len(),
        k,
        "narrowed by semantic relevance"
    );
    Ok(narrowed)
}
