//! The `recommend` command.
//!
//! Loads the catalog, builds the configured [`SemanticIndex`], runs the
//! pipeline under the request timeout, and prints the ranked records
//! together with the validation ledger.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use shelfwise_core::filter::FilterSpec;
use shelfwise_core::index::memory::InMemoryIndex;
use shelfwise_core::index::SemanticIndex;
use shelfwise_core::ledger::Status;
use shelfwise_core::models::RecordTable;
use shelfwise_core::pipeline::{self, PipelineParams, Recommendation};

use crate::catalog::load_catalog;
use crate::config::Config;
use crate::index_http::HttpIndex;

const EXCERPT_CHARS: usize = 160;

/// Parse a filter spec from inline JSON or a JSON file. Neither means no
/// filters.
pub fn parse_filters(inline: Option<&str>, file: Option<&Path>) -> Result<FilterSpec> {
    match (inline, file) {
        (Some(_), Some(_)) => bail!("Use either --filters or --filters-file, not both"),
        (Some(json), None) => serde_json::from_str(json).context("Failed to parse --filters JSON"),
        (None, Some(path)) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read filters file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse filters file: {}", path.display()))
        }
        (None, None) => Ok(FilterSpec::default()),
    }
}

/// Build the index named by `[index].provider`.
pub fn build_index(config: &Config, table: &RecordTable) -> Result<Box<dyn SemanticIndex>> {
    match config.index.provider.as_str() {
        "memory" => Ok(Box::new(InMemoryIndex::from_records(table.iter()))),
        "http" => Ok(Box::new(HttpIndex::from_config(&config.index)?)),
        other => bail!("Unknown index provider: '{}'", other),
    }
}

/// Load the catalog and run one recommendation request end to end.
pub async fn recommend(
    config: &Config,
    query: &str,
    spec: &FilterSpec,
    limit: Option<usize>,
) -> Result<Recommendation> {
    let query = query.trim();
    if query.is_empty() {
        bail!("Query must not be empty");
    }
    if limit == Some(0) {
        bail!("--limit must be >= 1");
    }

    let table = load_catalog(&config.catalog.path)?;
    let index = build_index(config, &table)?;
    let params = config.retrieval.pipeline_params(limit);

    info!(
        provider = %config.index.provider,
        records = table.len(),
        candidate_k = params.candidate_k,
        final_k = params.final_k,
        "running recommendation"
    );

    run_with_timeout(
        index.as_ref(),
        &table,
        query,
        spec,
        &params,
        config.retrieval.timeout_secs,
    )
    .await
}

/// Run the pipeline, failing once `timeout_secs` have elapsed.
pub async fn run_with_timeout(
    index: &dyn SemanticIndex,
    table: &RecordTable,
    query: &str,
    spec: &FilterSpec,
    params: &PipelineParams,
    timeout_secs: u64,
) -> Result<Recommendation> {
    let deadline = Duration::from_secs(timeout_secs);
    match tokio::time::timeout(deadline, pipeline::recommend(index, table, query, spec, params))
        .await
    {
        Ok(result) => result,
        Err(_) => bail!("Recommendation timed out after {}s", timeout_secs),
    }
}

/// Run the recommend command and print the result.
pub async fn run_recommend(
    config: &Config,
    query: &str,
    spec: &FilterSpec,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let rec = recommend(config, query, spec, limit).await?;

    for (key, entry) in rec.ledger.failures() {
        warn!(key, message = %entry.message, "filter validation failed");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rec)?);
        return Ok(());
    }

    print_text(&rec);
    Ok(())
}

fn print_text(rec: &Recommendation) {
    if rec.records.is_empty() {
        println!("No results.");
    }

    for (i, scored) in rec.records.iter().enumerate() {
        let record = &scored.record;
        println!(
            "{}. [{:.2}] {} / {}",
            i + 1,
            scored.rerank_score,
            record.category,
            record.title
        );
        if !record.authors.is_empty() {
            println!("    authors: {}", record.authors);
        }
        println!(
            "    pages: {}",
            record
                .pages
                .map(|p| p.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        println!(
            "    year: {}",
            record
                .published_year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        println!("    excerpt: \"{}\"", excerpt(&record.description));
        println!("    isbn13: {}", record.id);
        println!();
    }

    if rec.ledger.is_empty() {
        return;
    }

    println!("Filters:");
    for (key, entry) in rec.ledger.iter() {
        let status = match entry.status {
            Status::Success => "ok",
            Status::Failed => "FAILED",
        };
        println!(
            "  {:<24} {:<6} {:>6} -> {:<6} {}",
            key, status, entry.num_books_before, entry.num_books_after, entry.message
        );
    }
}

fn excerpt(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat.to_string();
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}
