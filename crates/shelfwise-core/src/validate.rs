//! Self-verification of filter output.
//!
//! Every stage filters first and then hands its output to [`validate`],
//! which re-checks each surviving record against the constraint with a
//! predicate written independently of the filter. The first violating
//! record fails the ledger entry and names the offending value; a clean
//! scan writes a success entry summarizing the narrowing.
//!
//! Keep the two passes separate: the validator exists to catch filter
//! regressions, so it must not share the filter's code path.

use serde_json::Value;

use crate::filter::{CategoryTarget, PublishedYear, RejectedField};
use crate::ledger::{LedgerEntry, Status, ValidationLedger};
use crate::models::{ItemRecord, Tone};

/// A constraint together with the value it was applied with.
#[derive(Debug, Clone, Copy)]
pub enum Constraint<'a> {
    Author(&'a [String]),
    Category(CategoryTarget),
    PagesMin(i64),
    PagesMax(i64),
    /// The effective bounds, after contradictory parts were dropped.
    PublishedYear(PublishedYear),
    Keywords(&'a [String]),
}

impl Constraint<'_> {
    pub fn ledger_key(&self) -> &'static str {
        match self {
            Constraint::Author(_) => "applied_author",
            Constraint::Category(_) => "applied_genre",
            Constraint::PagesMin(_) => "applied_min_pages",
            Constraint::PagesMax(_) => "applied_max_pages",
            Constraint::PublishedYear(_) => "applied_published_year",
            Constraint::Keywords(_) => "applied_keywords",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Constraint::Author(_) => "authors",
            Constraint::Category(_) => "genre",
            Constraint::PagesMin(_) => "pages_min",
            Constraint::PagesMax(_) => "pages_max",
            Constraint::PublishedYear(_) => "published_year",
            Constraint::Keywords(_) => "keywords",
        }
    }

    pub fn filter_value(&self) -> Value {
        match self {
            Constraint::Author(authors) => Value::from(authors.to_vec()),
            Constraint::Category(target) => target.to_value(),
            Constraint::PagesMin(n) | Constraint::PagesMax(n) => Value::from(*n),
            Constraint::PublishedYear(year) => {
                serde_json::to_value(year).unwrap_or(Value::Null)
            }
            Constraint::Keywords(keywords) => Value::from(keywords.to_vec()),
        }
    }

    /// Re-check one record. `Err` carries the failure message.
    fn check(&self, record: &ItemRecord) -> Result<(), String> {
        match self {
            Constraint::Author(authors) => {
                let haystack = record.authors.to_lowercase();
                if authors
                    .iter()
                    .any(|a| haystack.contains(&a.to_lowercase()))
                {
                    Ok(())
                } else {
                    Err(format!(
                        "Failed Author Filter: Expected one of {:?}, but found '{}' (record {})",
                        authors, record.authors, record.id
                    ))
                }
            }
            Constraint::Category(target) => {
                let expected = target.categories();
                if expected.contains(&record.category) {
                    Ok(())
                } else {
                    let expected: Vec<&str> = expected.iter().map(|c| c.as_str()).collect();
                    Err(format!(
                        "Failed Genre Filter: Expected one of {:?}, but found '{}' (record {})",
                        expected, record.category, record.id
                    ))
                }
            }
            Constraint::PagesMin(min) => match record.pages {
                Some(p) if i64::from(p) >= *min => Ok(()),
                found => Err(format!(
                    "Failed Min Pages Filter: Expected ≥{} pages, but found {} pages (record {})",
                    min,
                    display_opt(found),
                    record.id
                )),
            },
            Constraint::PagesMax(max) => match record.pages {
                Some(p) if i64::from(p) <= *max => Ok(()),
                found => Err(format!(
                    "Failed Max Pages Filter: Expected ≤{} pages, but found {} pages (record {})",
                    max,
                    display_opt(found),
                    record.id
                )),
            },
            Constraint::PublishedYear(bounds) => check_year(bounds, record),
            Constraint::Keywords(keywords) => {
                let description = record.description.to_lowercase();
                let title = record.title.to_lowercase();
                let found = keywords.iter().any(|k| {
                    let k = k.to_lowercase();
                    description.contains(&k) || title.contains(&k)
                });
                if found {
                    Ok(())
                } else {
                    Err(format!(
                        "Failed Keywords Filter: Expected keywords {:?} in description or title, but record {} contains none of them",
                        keywords, record.id
                    ))
                }
            }
        }
    }

    fn success_message(&self, before: usize, after: usize) -> String {
        match self {
            Constraint::PublishedYear(bounds) => format!(
                "Applied published_year ({}): narrowed {} → {} books.",
                bounds.describe(),
                before,
                after
            ),
            _ => format!(
                "Applied {}={}: narrowed {} → {} books.",
                self.name(),
                self.filter_value(),
                before,
                after
            ),
        }
    }
}

/// Unknown years cannot disprove the constraint and are exempt.
fn check_year(bounds: &PublishedYear, record: &ItemRecord) -> Result<(), String> {
    let Some(year) = record.published_year.map(i64::from) else {
        return Ok(());
    };

    if let Some(exact) = bounds.exact {
        if year != exact {
            return Err(format!(
                "Failed Exact Published Year Filter: Expected year {}, but found {} (record {})",
                exact, year, record.id
            ));
        }
        return Ok(());
    }
    if let Some(min) = bounds.min {
        if year < min {
            return Err(format!(
                "Failed Min Published Year Filter: Expected year ≥{}, but found {} (record {})",
                min, year, record.id
            ));
        }
    }
    if let Some(max) = bounds.max {
        if year > max {
            return Err(format!(
                "Failed Max Published Year Filter: Expected year ≤{}, but found {} (record {})",
                max, year, record.id
            ));
        }
    }
    Ok(())
}

fn display_opt(value: Option<u32>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

/// Verify `subset` against `constraint` and write the ledger entry.
///
/// Stops at the first violating record (fail-fast). A failure is recorded,
/// not raised; the caller keeps the flagged records.
pub fn validate(
    constraint: &Constraint<'_>,
    subset: &[&ItemRecord],
    count_before: usize,
    ledger: &mut ValidationLedger,
) {
    let key = constraint.ledger_key();
    let (status, message) = match subset.iter().find_map(|r| constraint.check(r).err()) {
        Some(message) => {
            tracing::warn!(key, %message, "filter self-check failed");
            (Status::Failed, message)
        }
        None => (
            Status::Success,
            constraint.success_message(count_before, subset.len()),
        ),
    };

    ledger.record(
        key,
        LedgerEntry {
            applied: true,
            num_books_before: count_before,
            num_books_after: subset.len(),
            filter_value: constraint.filter_value(),
            status,
            message,
        },
    );
}

/// Record a filter key that was dropped for having the wrong shape.
pub fn record_rejected(
    field: &RejectedField,
    ledger_key: &str,
    count: usize,
    ledger: &mut ValidationLedger,
) {
    ledger.record(
        ledger_key,
        LedgerEntry::ignored(
            field.value.clone(),
            count,
            format!(
                "Ignored {}={}: expected {}.",
                field.key, field.value, field.expected
            ),
        ),
    );
}

/// Verify that a tone reorder kept every record, and record it.
pub fn validate_tone(tone: Tone, before: usize, after: usize, ledger: &mut ValidationLedger) {
    let (status, message) = if before == after {
        (
            Status::Success,
            format!(
                "Applied tone={}: sorted books by {} score, narrowed {} → {} books.",
                tone, tone, before, after
            ),
        )
    } else {
        tracing::warn!(%tone, before, after, "tone ranking changed the record count");
        (
            Status::Failed,
            format!(
                "Failed Tone Ranking: Expected {} books to be reordered, but found {}",
                before, after
            ),
        )
    };

    ledger.record(
        "applied_tone",
        LedgerEntry {
            applied: true,
            num_books_before: before,
            num_books_after: after,
            filter_value: Value::from(tone.as_str()),
            status,
            message,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_books;
    use crate::models::Category;

    #[test]
    fn test_success_summarizes_narrowing() {
        let books = sample_books();
        let authors = vec!["Stephen King".to_string()];
        let subset: Vec<&ItemRecord> = books
            .iter()
            .filter(|b| b.authors == "Stephen King")
            .collect();
        let mut ledger = ValidationLedger::new();
        validate(&Constraint::Author(&authors), &subset, 10, &mut ledger);

        let entry = ledger.get("applied_author").unwrap();
        assert_eq!(entry.status, Status::Success);
        assert_eq!(entry.num_books_before, 10);
        assert_eq!(entry.num_books_after, 2);
        assert_eq!(
            entry.message,
            "Applied authors=[\"Stephen King\"]: narrowed 10 → 2 books."
        );
    }

    #[test]
    fn test_fail_fast_names_first_offender() {
        let books = sample_books();
        // A buggy filter that let every Fiction book through for pages_min=300.
        let subset: Vec<&ItemRecord> = books
            .iter()
            .filter(|b| b.category == Category::Fiction)
            .collect();
        let mut ledger = ValidationLedger::new();
        validate(&Constraint::PagesMin(300), &subset, 10, &mut ledger);

        let entry = ledger.get("applied_min_pages").unwrap();
        assert_eq!(entry.status, Status::Failed);
        assert!(entry.applied);
        // 1984 (200 pages) is the first Fiction record and the first violation.
        assert!(entry.message.contains("found 200 pages"), "{}", entry.message);
        assert!(entry.message.contains("9780451524935"));
        assert!(!entry.message.contains("250"));
    }

    #[test]
    fn test_union_category_check() {
        let books = sample_books();
        let subset: Vec<&ItemRecord> = books.iter().collect();
        let mut ledger = ValidationLedger::new();
        validate(
            &Constraint::Category(CategoryTarget::AnyChildren),
            &subset,
            10,
            &mut ledger,
        );
        let entry = ledger.get("applied_genre").unwrap();
        assert_eq!(entry.status, Status::Failed);
        assert!(entry.message.contains("found 'Fiction'"));
        assert_eq!(
            entry.filter_value,
            serde_json::json!(["Children's Fiction", "Children's Nonfiction"])
        );
    }

    #[test]
    fn test_year_validation_exempts_unknown_years() {
        let books = sample_books();
        let almanac: Vec<&ItemRecord> = books
            .iter()
            .filter(|b| b.published_year.is_none())
            .collect();
        assert_eq!(almanac.len(), 1);
        let mut ledger = ValidationLedger::new();
        let bounds = PublishedYear {
            exact: Some(1990),
            ..Default::default()
        };
        validate(&Constraint::PublishedYear(bounds), &almanac, 10, &mut ledger);
        let entry = ledger.get("applied_published_year").unwrap();
        assert_eq!(entry.status, Status::Success);
        assert_eq!(
            entry.message,
            "Applied published_year (exact=1990): narrowed 10 → 1 books."
        );
    }

    #[test]
    fn test_year_validation_exact_takes_priority() {
        let books = sample_books();
        let subset: Vec<&ItemRecord> = books
            .iter()
            .filter(|b| b.published_year == Some(1977))
            .collect();
        let bounds = PublishedYear {
            min: Some(2000),
            max: None,
            exact: Some(1977),
        };
        let mut ledger = ValidationLedger::new();
        validate(&Constraint::PublishedYear(bounds), &subset, 10, &mut ledger);
        assert_eq!(
            ledger.get("applied_published_year").unwrap().status,
            Status::Success
        );
    }

    #[test]
    fn test_keywords_check_covers_title() {
        let books = sample_books();
        let keywords = vec!["chocolate".to_string()];
        let subset: Vec<&ItemRecord> = books
            .iter()
            .filter(|b| b.title.contains("Chocolate"))
            .collect();
        let mut ledger = ValidationLedger::new();
        validate(&Constraint::Keywords(&keywords), &subset, 10, &mut ledger);
        assert_eq!(
            ledger.get("applied_keywords").unwrap().status,
            Status::Success
        );
    }

    #[test]
    fn test_tone_count_mismatch_fails() {
        let mut ledger = ValidationLedger::new();
        validate_tone(Tone::Fear, 5, 4, &mut ledger);
        let entry = ledger.get("applied_tone").unwrap();
        assert_eq!(entry.status, Status::Failed);
        assert_eq!(entry.filter_value, serde_json::json!("fear"));
    }
}
