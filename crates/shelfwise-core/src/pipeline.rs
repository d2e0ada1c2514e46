//! The filter → narrow → rerank pipeline.
//!
//! ```text
//! RecordTable ─▶ pre-filter ─▶ narrow (SemanticIndex) ─▶ rerank ─▶ (records, ledger)
//! ```
//!
//! Each stage returns a new candidate set; the ledger accumulates one entry
//! per requested constraint and is returned whole. The only fallible step
//! is the semantic index call.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::filter::FilterSpec;
use crate::index::SemanticIndex;
use crate::ledger::ValidationLedger;
use crate::models::RecordTable;
use crate::narrow::narrow;
use crate::prefilter::apply_pre_filters;
use crate::rerank::{rerank, ScoredRecord};

/// Result-size tuning, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineParams {
    /// Records kept by semantic narrowing.
    pub candidate_k: usize,
    /// Records returned after reranking.
    pub final_k: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            candidate_k: 50,
            final_k: 16,
        }
    }
}

/// Final ranked records plus the complete validation ledger.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// The normalized filter spec the stages actually ran with.
    pub filters: FilterSpec,
    pub records: Vec<ScoredRecord>,
    pub ledger: ValidationLedger,
}

/// Run the full pipeline for one request.
///
/// # Errors
///
/// Only a failing [`SemanticIndex::search`] is propagated. Empty results
/// and validator failures are reported in the returned value.
pub async fn recommend<I>(
    index: &I,
    table: &RecordTable,
    query: &str,
    spec: &FilterSpec,
    params: &PipelineParams,
) -> Result<Recommendation>
where
    I: SemanticIndex + ?Sized,
{
    let filters = spec.normalized();
    let mut ledger = ValidationLedger::new();

    let candidates = apply_pre_filters(table.iter().collect(), &filters, &mut ledger);
    let prefiltered = candidates.len();

    let narrowed = narrow(query, candidates, index, params.candidate_k).await?;
    let narrowed_count = narrowed.len();

    let records = rerank(narrowed, &filters, &mut ledger, params.final_k);

    info!(
        catalog = table.len(),
        prefiltered,
        narrowed = narrowed_count,
        returned = records.len(),
        constraints = ledger.len(),
        failures = ledger.failures().count(),
        "recommendation complete"
    );

    Ok(Recommendation {
        filters,
        records,
        ledger,
    })
}
