//! Post-filter and rerank stage.
//!
//! # Scoring
//!
//! 1. Keywords (when present) first act as a hard filter: a record must
//!    mention at least one keyword in its description or title. The
//!    removal is self-checked into the ledger.
//! 2. Each survivor starts at score 0. Per keyword it gains its
//!    description frequency divided by the highest frequency among the
//!    survivors (so the top mentioner scores 1.0), plus
//!    [`TITLE_WEIGHT`] if the title contains the keyword.
//! 3. A recognized tone adds
//!    `(0.6 × primary + 0.4 × purity) × TONE_WEIGHT`, where
//!    `purity = max(0, primary − 0.3 × mean(other six tones))`.
//! 4. Stable sort by score (desc), so the incoming relevance order breaks
//!    ties, then truncate to `k`.
//!
//! Tone never removes a record; it only reorders.

use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::filter::FilterSpec;
use crate::ledger::{LedgerEntry, ValidationLedger};
use crate::models::{ItemRecord, Tone, ToneScores};
use crate::validate::{record_rejected, validate, validate_tone, Constraint};

/// Boost for a keyword appearing in the title.
pub const TITLE_WEIGHT: f64 = 2.0;
/// Multiplier on the blended tone score (double a single keyword hit).
pub const TONE_WEIGHT: f64 = 2.0;
/// Share of the blended tone score taken by the raw primary tone value.
pub const PRIMARY_SHARE: f64 = 0.6;
/// Penalty applied to the mean of competing tones when computing purity.
pub const COMPETING_TONE_PENALTY: f64 = 0.3;

/// A ranked record with its ephemeral rerank score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: ItemRecord,
    pub rerank_score: f64,
}

/// How strongly `tone` dominates the record's other tones, floored at 0.
pub fn tone_purity(tones: &ToneScores, tone: Tone) -> f64 {
    let primary = tones.get(tone);
    let others: Vec<f64> = Tone::ALL
        .iter()
        .filter(|&&t| t != tone)
        .map(|&t| tones.get(t))
        .collect();
    let mean = others.iter().sum::<f64>() / others.len() as f64;
    (primary - COMPETING_TONE_PENALTY * mean).max(0.0)
}

/// Tone contribution to a record's rerank score.
pub fn tone_score(tones: &ToneScores, tone: Tone) -> f64 {
    let primary = tones.get(tone);
    let purity = tone_purity(tones, tone);
    (PRIMARY_SHARE * primary + (1.0 - PRIMARY_SHARE) * purity) * TONE_WEIGHT
}

fn mentions(record: &ItemRecord, needle: &str) -> bool {
    record.description.to_lowercase().contains(needle) || record.title.to_lowercase().contains(needle)
}

/// Apply keyword containment, score, sort, and truncate to `k`.
pub fn rerank(
    records: Vec<&ItemRecord>,
    spec: &FilterSpec,
    ledger: &mut ValidationLedger,
    k: usize,
) -> Vec<ScoredRecord> {
    let mut books = records;

    let keywords: Option<Vec<String>> = spec
        .keywords()
        .map(|ks| ks.iter().map(|k| k.to_lowercase()).collect());

    if let (Some(requested), Some(needles)) = (spec.keywords(), keywords.as_ref()) {
        let before = books.len();
        books.retain(|b| needles.iter().any(|n| mentions(b, n)));
        debug!(before, after = books.len(), "applied keywords filter");
        validate(&Constraint::Keywords(requested), &books, before, ledger);
    } else if let Some(field) = spec.rejected("keywords") {
        record_rejected(field, "applied_keywords", books.len(), ledger);
    }

    let tone = spec.tone();
    if let (Some(text), None) = (spec.tone_text(), tone) {
        warn!(tone = text, "unrecognized tone ignored");
        ledger.record(
            "applied_tone",
            LedgerEntry::ignored(
                json!(text),
                books.len(),
                format!("Ignored tone='{}': not a recognized tone.", text),
            ),
        );
    } else if let Some(field) = spec.rejected("tone") {
        record_rejected(field, "applied_tone", books.len(), ledger);
    }

    if books.is_empty() {
        if let Some(tone) = tone {
            validate_tone(tone, 0, 0, ledger);
        }
        return Vec::new();
    }

    let mut scored: Vec<(&ItemRecord, f64)> = books.iter().map(|&b| (b, 0.0)).collect();

    if let Some(needles) = &keywords {
        let descriptions: Vec<String> = books.iter().map(|b| b.description.to_lowercase()).collect();
        let titles: Vec<String> = books.iter().map(|b| b.title.to_lowercase()).collect();
        for needle in needles {
            let freqs: Vec<usize> = descriptions
                .iter()
                .map(|d| d.matches(needle.as_str()).count())
                .collect();
            let max_freq = freqs.iter().copied().max().unwrap_or(0);
            for (i, (_, score)) in scored.iter_mut().enumerate() {
                if max_freq > 0 {
                    *score += freqs[i] as f64 / max_freq as f64;
                }
                if titles[i].contains(needle.as_str()) {
                    *score += TITLE_WEIGHT;
                }
            }
        }
    }

    if let Some(tone) = tone {
        for (record, score) in scored.iter_mut() {
            *score += tone_score(&record.tones, tone);
        }
    }

    // sort_by is stable: equal scores keep the incoming relevance order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    if let Some(tone) = tone {
        validate_tone(tone, books.len(), scored.len(), ledger);
    }

    scored.truncate(k);
    debug!(returned = scored.len(), k, "reranked");

    scored
        .into_iter()
        .map(|(record, rerank_score)| ScoredRecord {
            record: record.clone(),
            rerank_score,
        })
        .collect()
}
