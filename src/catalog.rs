//! Catalog loading and overview.
//!
//! The catalog is a file of book rows, either a JSON array (`.json`) or
//! one JSON object per line (`.jsonl`). It is read fresh for every request
//! and never mutated. Used by `shelfwise recommend` to build the record
//! table and by `shelfwise catalog` to print per-category counts.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use shelfwise_core::models::{Category, ItemRecord, RecordTable};

use crate::config::Config;

/// Read the catalog at `path` into a [`RecordTable`].
///
/// Rows sharing an identifier keep the first occurrence; later ones are
/// dropped with a warning.
pub fn load_catalog(path: &Path) -> Result<RecordTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;

    let rows = if is_json_lines(path) {
        parse_json_lines(&content)
    } else {
        serde_json::from_str::<Vec<ItemRecord>>(&content).map_err(anyhow::Error::from)
    }
    .with_context(|| format!("Failed to parse catalog: {}", path.display()))?;

    let total = rows.len();
    let table = RecordTable::new(dedupe(rows));
    debug!(path = %path.display(), rows = total, records = table.len(), "catalog loaded");
    Ok(table)
}

fn is_json_lines(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"))
}

fn parse_json_lines(content: &str) -> Result<Vec<ItemRecord>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}", i + 1))
        })
        .collect()
}

fn dedupe(rows: Vec<ItemRecord>) -> Vec<ItemRecord> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            let fresh = seen.insert(row.id.clone());
            if !fresh {
                warn!(id = %row.id, title = %row.title, "duplicate catalog identifier dropped");
            }
            fresh
        })
        .collect()
}

/// Record count per category, in canonical category order. Categories
/// without records are included with a zero count.
pub fn summarize(table: &RecordTable) -> Vec<(Category, usize)> {
    Category::ALL
        .iter()
        .map(|&category| {
            let count = table.iter().filter(|r| r.category == category).count();
            (category, count)
        })
        .collect()
}

/// Run the catalog command: load the catalog and print a summary.
pub fn run_catalog(config: &Config) -> Result<()> {
    let table = load_catalog(&config.catalog.path)?;

    println!("Shelfwise — Catalog");
    println!("===================");
    println!();
    println!("  Catalog:     {}", config.catalog.path.display());
    println!("  Records:     {}", table.len());
    println!(
        "  No pages:    {}",
        table.iter().filter(|r| r.pages.is_none()).count()
    );
    println!(
        "  No year:     {}",
        table.iter().filter(|r| r.published_year.is_none()).count()
    );
    println!();
    println!("  By category:");
    println!("  {:<24} {:>8}", "CATEGORY", "RECORDS");
    println!("  {}", "-".repeat(33));
    for (category, count) in summarize(&table) {
        println!("  {:<24} {:>8}", category.as_str(), count);
    }
    println!();

    Ok(())
}
