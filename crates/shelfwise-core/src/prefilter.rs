//! Pre-filter stage: exact, range, and set constraints over the record table.
//!
//! Constraints run in a fixed order: author → genre/children → pages_min →
//! pages_max → published_year. Each one narrows the current candidate set
//! into a new vector and is immediately self-checked by
//! [`validate`](crate::validate::validate). An empty result is valid output.
//! A key dropped for having the wrong shape is recorded as ignored at the
//! point where it would have applied.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::filter::{CategoryTarget, FilterSpec, PublishedYear};
use crate::ledger::{LedgerEntry, ValidationLedger};
use crate::models::ItemRecord;
use crate::validate::{record_rejected, validate, Constraint};

/// Apply every requested pre-filter constraint to `records`.
pub fn apply_pre_filters<'a>(
    records: Vec<&'a ItemRecord>,
    spec: &FilterSpec,
    ledger: &mut ValidationLedger,
) -> Vec<&'a ItemRecord> {
    let mut books = records;

    if let Some(authors) = spec.authors() {
        let before = books.len();
        let needles: Vec<String> = authors.iter().map(|a| a.to_lowercase()).collect();
        books.retain(|b| {
            let field = b.authors.to_lowercase();
            needles.iter().any(|n| field.contains(n.as_str()))
        });
        debug!(before, after = books.len(), "applied author filter");
        validate(&Constraint::Author(authors), &books, before, ledger);
    } else if let Some(field) = spec.rejected("author") {
        record_rejected(field, "applied_author", books.len(), ledger);
    }

    books = apply_genre_family(books, spec, ledger);

    // A minimum above the maximum is contradictory; the minimum wins.
    let pages_max = match (spec.pages_min(), spec.pages_max()) {
        (Some(min), Some(max)) if min > max => {
            warn!(min, max, "pages_min exceeds pages_max; ignoring pages_max");
            None
        }
        (_, max) => max,
    };

    if let Some(min) = spec.pages_min() {
        let before = books.len();
        books.retain(|b| b.pages.is_some_and(|p| i64::from(p) >= min));
        debug!(before, after = books.len(), min, "applied pages_min filter");
        validate(&Constraint::PagesMin(min), &books, before, ledger);
    } else if let Some(field) = spec.rejected("pages_min") {
        record_rejected(field, "applied_min_pages", books.len(), ledger);
    }

    match (spec.pages_max(), pages_max) {
        (Some(max), Some(_)) => {
            let before = books.len();
            books.retain(|b| b.pages.is_some_and(|p| i64::from(p) <= max));
            debug!(before, after = books.len(), max, "applied pages_max filter");
            validate(&Constraint::PagesMax(max), &books, before, ledger);
        }
        (Some(max), None) => {
            ledger.record(
                "applied_max_pages",
                LedgerEntry::ignored(
                    json!(max),
                    books.len(),
                    format!(
                        "Ignored pages_max={}: contradicts pages_min={}.",
                        max,
                        spec.pages_min().unwrap_or_default()
                    ),
                ),
            );
        }
        (None, _) => {
            if let Some(field) = spec.rejected("pages_max") {
                record_rejected(field, "applied_max_pages", books.len(), ledger);
            }
        }
    }

    if let Some(requested) = spec.published_year() {
        let bounds = effective_year_bounds(requested);
        let before = books.len();
        books.retain(|b| year_in_bounds(b.published_year, &bounds));
        debug!(before, after = books.len(), bounds = %bounds.describe(), "applied published_year filter");
        validate(&Constraint::PublishedYear(bounds), &books, before, ledger);
    } else if let Some(field) = spec.rejected("published_year") {
        record_rejected(field, "applied_published_year", books.len(), ledger);
    }

    books
}

fn apply_genre_family<'a>(
    books: Vec<&'a ItemRecord>,
    spec: &FilterSpec,
    ledger: &mut ValidationLedger,
) -> Vec<&'a ItemRecord> {
    let genre = spec.genre();

    // Parts of the genre/children pair that were requested but cannot apply.
    let mut dropped = Vec::new();
    if let Some(text) = spec.genre_text().filter(|_| genre.is_none()) {
        warn!(genre = text, "unrecognized genre ignored");
        dropped.push(format!(
            "genre='{}' (not a recognized genre; expected Fiction or Nonfiction)",
            text
        ));
    }
    for key in ["genre", "children"] {
        if let Some(field) = spec.rejected(key) {
            dropped.push(format!(
                "{}={} (expected {})",
                field.key, field.value, field.expected
            ));
        }
    }

    if genre.is_none() && spec.children().is_none() && dropped.is_empty() {
        return books;
    }

    let Some(target) = CategoryTarget::resolve(genre, spec.children()) else {
        let message = if dropped.is_empty() {
            "No genre filter: children=false without a genre selects every category.".to_string()
        } else {
            format!("Ignored {}.", dropped.join("; "))
        };
        let raw = |key: &str, parsed: Option<Value>| {
            parsed.or_else(|| spec.rejected(key).map(|r| r.value.clone()))
        };
        ledger.record(
            "applied_genre",
            LedgerEntry::ignored(
                json!({
                    "genre": raw("genre", spec.genre_text().map(Value::from)),
                    "children": raw("children", spec.children().map(Value::from)),
                }),
                books.len(),
                message,
            ),
        );
        return books;
    };

    let before = books.len();
    let filtered: Vec<&ItemRecord> = match target {
        CategoryTarget::Exact(category) => books
            .into_iter()
            .filter(|b| b.category == category)
            .collect(),
        CategoryTarget::AnyChildren => books
            .into_iter()
            .filter(|b| b.category.is_children())
            .collect(),
    };
    debug!(before, after = filtered.len(), target = %target.to_value(), "applied genre filter");
    validate(&Constraint::Category(target), &filtered, before, ledger);
    if !dropped.is_empty() {
        ledger.annotate("applied_genre", &format!("Ignored {}.", dropped.join("; ")));
    }
    filtered
}

/// `exact` wins outright; otherwise a minimum above the maximum drops the maximum.
fn effective_year_bounds(requested: &PublishedYear) -> PublishedYear {
    if requested.exact.is_some() {
        return *requested;
    }
    match (requested.min, requested.max) {
        (Some(min), Some(max)) if min > max => {
            warn!(min, max, "published_year.min exceeds max; ignoring max");
            PublishedYear {
                max: None,
                ..*requested
            }
        }
        _ => *requested,
    }
}

fn year_in_bounds(year: Option<i32>, bounds: &PublishedYear) -> bool {
    let Some(year) = year.map(i64::from) else {
        return false;
    };
    match bounds.exact {
        Some(exact) => year == exact,
        None => {
            bounds.min.map_or(true, |min| year >= min) && bounds.max.map_or(true, |max| year <= max)
        }
    }
}
