//! The sparse filter spec produced by the filter extractor.
//!
//! Every constraint is optional. A missing key, an explicit `null`, an empty
//! list, and a blank string all mean "not requested"; an explicit
//! `children: false` still counts as present. Presence is always tested
//! through the accessor methods, never the raw fields.
//!
//! The extractor is untrusted, so [`FilterSpec::normalized`] is applied
//! once at the pipeline boundary before any stage reads the spec.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::models::{Category, Tone};

/// Structured constraints for one request.
///
/// Deserialization is lenient per key: a value of the wrong JSON type is
/// dropped and kept in [`FilterSpec::rejected`] instead of failing the
/// whole spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSpec {
    /// Author substrings, OR-matched case-insensitively.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Vec<String>>,
    /// `Fiction` or `Nonfiction` (loosely spelled variants are accepted).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<PublishedYear>,
    /// Content terms matched against description and title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Tone name used for ranking only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    /// Keys whose values had the wrong shape and were dropped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedField>,
}

/// A filter key dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedField {
    pub key: String,
    pub value: Value,
    /// The shape the key should have had, e.g. `"an integer"`.
    pub expected: &'static str,
}

/// Publication-year bounds. `exact` wins over `min`/`max` when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishedYear {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<i64>,
}

impl PublishedYear {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.exact.is_none()
    }

    /// `exact=1990, min=2000` style summary of the bounds that are set.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(exact) = self.exact {
            parts.push(format!("exact={}", exact));
        }
        if let Some(min) = self.min {
            parts.push(format!("min={}", min));
        }
        if let Some(max) = self.max {
            parts.push(format!("max={}", max));
        }
        parts.join(", ")
    }
}

impl<'de> Deserialize<'de> for FilterSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(object) => Ok(FilterSpec::from_object(object)),
            Value::Null => Ok(FilterSpec::default()),
            other => Err(serde::de::Error::custom(format!(
                "filter spec must be a JSON object, found {}",
                other
            ))),
        }
    }
}

impl FilterSpec {
    /// Pick each known key out of `object`. `names` is accepted for
    /// `keywords`; unknown keys are skipped.
    fn from_object(mut object: Map<String, Value>) -> FilterSpec {
        if !object.contains_key("keywords") {
            if let Some(names) = object.remove("names") {
                object.insert("keywords".to_string(), names);
            }
        }

        let mut rejected = Vec::new();
        let obj = &mut object;
        let spec = FilterSpec {
            author: pick(obj, &mut rejected, "author", STRINGS, string_list),
            genre: pick(obj, &mut rejected, "genre", STRING, |v| v.as_str().map(str::to_string)),
            children: pick(obj, &mut rejected, "children", BOOLEAN, Value::as_bool),
            pages_min: pick(obj, &mut rejected, "pages_min", INTEGER, integer),
            pages_max: pick(obj, &mut rejected, "pages_max", INTEGER, integer),
            published_year: pick(obj, &mut rejected, "published_year", YEAR_BOUNDS, year_bounds),
            keywords: pick(obj, &mut rejected, "keywords", STRINGS, string_list),
            tone: pick(obj, &mut rejected, "tone", STRING, |v| v.as_str().map(str::to_string)),
            rejected,
        };

        if !object.is_empty() {
            debug!(keys = ?object.keys().collect::<Vec<_>>(), "unknown filter keys ignored");
        }
        spec
    }
}

const STRING: &str = "a string";
const STRINGS: &str = "a string or a list of strings";
const BOOLEAN: &str = "a boolean";
const INTEGER: &str = "an integer";
const YEAR_BOUNDS: &str = "an object with integer min, max or exact";

/// Remove `key` and parse it. `null` counts as absent; a value `parse`
/// rejects is recorded in `rejected`.
fn pick<T>(
    object: &mut Map<String, Value>,
    rejected: &mut Vec<RejectedField>,
    key: &str,
    expected: &'static str,
    parse: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let value = object.remove(key).filter(|v| !v.is_null())?;
    let parsed = parse(&value);
    if parsed.is_none() {
        warn!(key, value = %value, expected, "malformed filter value dropped");
        rejected.push(RejectedField {
            key: key.to_string(),
            value,
            expected,
        });
    }
    parsed
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// Integers, including floats with no fractional part (`300.0`).
fn integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn year_bounds(value: &Value) -> Option<PublishedYear> {
    let object = value.as_object()?;
    let bound = |key: &str| -> Option<Option<i64>> {
        match object.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(v) => integer(v).map(Some),
        }
    };
    Some(PublishedYear {
        min: bound("min")?,
        max: bound("max")?,
        exact: bound("exact")?,
    })
}

/// Adult genre family requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Fiction,
    Nonfiction,
}

impl Genre {
    /// Normalize free-form genre text.
    ///
    /// Any "non fiction" spelling (`non-fiction`, `nonfiction`,
    /// `Non Fiction`) maps to [`Genre::Nonfiction`]; a standalone `fiction`
    /// maps to [`Genre::Fiction`]. Everything else is unrecognized.
    pub fn parse(text: &str) -> Option<Genre> {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        if contains_nonfiction(&lower) {
            return Some(Genre::Nonfiction);
        }
        if word_start_positions(&lower, "fiction").next().is_some() {
            return Some(Genre::Fiction);
        }
        None
    }

    pub fn category(self) -> Category {
        match self {
            Genre::Fiction => Category::Fiction,
            Genre::Nonfiction => Category::Nonfiction,
        }
    }

    /// The `"Children's " + genre` category.
    pub fn children_category(self) -> Category {
        match self {
            Genre::Fiction => Category::ChildrensFiction,
            Genre::Nonfiction => Category::ChildrensNonfiction,
        }
    }
}

/// Byte offsets where `needle` starts and is not preceded by a letter.
fn word_start_positions<'a>(haystack: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
    haystack.match_indices(needle).filter_map(move |(pos, _)| {
        let preceded_by_letter = haystack[..pos]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphabetic());
        (!preceded_by_letter).then_some(pos)
    })
}

fn contains_nonfiction(lower: &str) -> bool {
    word_start_positions(lower, "non").any(|pos| {
        let rest = lower[pos + "non".len()..].trim_start_matches(|c: char| !c.is_alphabetic());
        rest.starts_with("fiction")
    })
}

/// Category set selected by the genre/children pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryTarget {
    /// A single category: `genre` verbatim, or `"Children's " + genre`.
    Exact(Category),
    /// Children requested without a genre: the union of both children's
    /// categories. There is no single category for this case.
    AnyChildren,
}

impl CategoryTarget {
    pub fn resolve(genre: Option<Genre>, children: Option<bool>) -> Option<CategoryTarget> {
        match (genre, children.unwrap_or(false)) {
            (Some(g), true) => Some(CategoryTarget::Exact(g.children_category())),
            (Some(g), false) => Some(CategoryTarget::Exact(g.category())),
            (None, true) => Some(CategoryTarget::AnyChildren),
            (None, false) => None,
        }
    }

    pub fn categories(&self) -> Vec<Category> {
        match self {
            CategoryTarget::Exact(c) => vec![*c],
            CategoryTarget::AnyChildren => {
                vec![Category::ChildrensFiction, Category::ChildrensNonfiction]
            }
        }
    }

    /// Ledger value: the category label, or the list of labels for a union.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            CategoryTarget::Exact(c) => serde_json::Value::from(c.as_str()),
            CategoryTarget::AnyChildren => serde_json::Value::from(
                self.categories()
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>(),
            ),
        }
    }
}

impl FilterSpec {
    pub fn authors(&self) -> Option<&[String]> {
        self.author.as_deref().filter(|a| !a.is_empty())
    }

    pub fn genre_text(&self) -> Option<&str> {
        self.genre.as_deref().map(str::trim).filter(|g| !g.is_empty())
    }

    pub fn genre(&self) -> Option<Genre> {
        self.genre_text().and_then(Genre::parse)
    }

    pub fn children(&self) -> Option<bool> {
        self.children
    }

    pub fn pages_min(&self) -> Option<i64> {
        self.pages_min
    }

    pub fn pages_max(&self) -> Option<i64> {
        self.pages_max
    }

    pub fn published_year(&self) -> Option<&PublishedYear> {
        self.published_year.as_ref().filter(|y| !y.is_empty())
    }

    pub fn keywords(&self) -> Option<&[String]> {
        self.keywords.as_deref().filter(|k| !k.is_empty())
    }

    pub fn tone_text(&self) -> Option<&str> {
        self.tone.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn tone(&self) -> Option<Tone> {
        self.tone_text().and_then(Tone::parse)
    }

    /// The dropped value for `key`, if it had the wrong shape.
    pub fn rejected(&self, key: &str) -> Option<&RejectedField> {
        self.rejected.iter().find(|r| r.key == key)
    }

    /// True when no constraint at all is requested.
    pub fn is_empty(&self) -> bool {
        self.authors().is_none()
            && self.genre_text().is_none()
            && self.children.is_none()
            && self.pages_min.is_none()
            && self.pages_max.is_none()
            && self.published_year().is_none()
            && self.keywords().is_none()
            && self.tone_text().is_none()
            && self.rejected.is_empty()
    }

    /// Clean an extractor-produced spec.
    ///
    /// List entries are trimmed and blanks dropped; empty lists, blank
    /// strings and empty year objects collapse to `None`. Keywords that
    /// repeat another constraint's value (an author, the genre, the tone, a
    /// page or year bound) or an earlier keyword are removed,
    /// case-insensitively, keeping the first occurrence.
    pub fn normalized(&self) -> FilterSpec {
        let mut spec = FilterSpec {
            author: clean_list(self.author.as_deref()),
            genre: self.genre_text().map(str::to_string),
            children: self.children,
            pages_min: self.pages_min,
            pages_max: self.pages_max,
            published_year: self.published_year().copied(),
            keywords: clean_list(self.keywords.as_deref()),
            tone: self.tone_text().map(str::to_string),
            rejected: self.rejected.clone(),
        };

        if let Some(keywords) = spec.keywords.take() {
            let reserved = spec.reserved_tokens();
            let mut seen = HashSet::new();
            let kept: Vec<String> = keywords
                .into_iter()
                .filter(|k| {
                    let norm = k.to_lowercase();
                    !reserved.contains(&norm) && seen.insert(norm)
                })
                .collect();
            spec.keywords = (!kept.is_empty()).then_some(kept);
        }

        spec
    }

    fn reserved_tokens(&self) -> HashSet<String> {
        let mut tokens = HashSet::new();
        for author in self.authors().unwrap_or_default() {
            tokens.insert(author.to_lowercase());
        }
        if let Some(genre) = self.genre_text() {
            tokens.insert(genre.to_lowercase());
        }
        if let Some(tone) = self.tone_text() {
            tokens.insert(tone.to_lowercase());
        }
        let numbers = [self.pages_min, self.pages_max]
            .into_iter()
            .chain(
                self.published_year()
                    .map(|y| [y.min, y.max, y.exact])
                    .unwrap_or_default(),
            )
            .flatten();
        for n in numbers {
            tokens.insert(n.to_string());
        }
        tokens
    }
}

fn clean_list(list: Option<&[String]>) -> Option<Vec<String>> {
    let cleaned: Vec<String> = list?
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_null_and_empty_are_equivalent() {
        let missing: FilterSpec = serde_json::from_str("{}").unwrap();
        let nulls: FilterSpec = serde_json::from_str(
            r#"{"author": null, "genre": null, "keywords": [], "tone": "  ",
                "published_year": {"min": null, "max": null, "exact": null}}"#,
        )
        .unwrap();
        assert!(missing.is_empty());
        assert!(nulls.is_empty());
        assert_eq!(missing.normalized(), nulls.normalized());
    }

    #[test]
    fn test_explicit_false_children_is_present() {
        let spec: FilterSpec = serde_json::from_str(r#"{"children": false}"#).unwrap();
        assert_eq!(spec.children(), Some(false));
        assert!(!spec.is_empty());
    }

    #[test]
    fn test_bare_string_and_names_alias() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"author": "Stephen King", "names": ["wizard"]}"#).unwrap();
        assert_eq!(spec.authors(), Some(&["Stephen King".to_string()][..]));
        assert_eq!(spec.keywords(), Some(&["wizard".to_string()][..]));
    }

    #[test]
    fn test_genre_parse_variants() {
        assert_eq!(Genre::parse("Fiction"), Some(Genre::Fiction));
        assert_eq!(Genre::parse("fiction"), Some(Genre::Fiction));
        assert_eq!(Genre::parse("Nonfiction"), Some(Genre::Nonfiction));
        assert_eq!(Genre::parse("non-fiction"), Some(Genre::Nonfiction));
        assert_eq!(Genre::parse("Non Fiction"), Some(Genre::Nonfiction));
        assert_eq!(Genre::parse("science fiction"), Some(Genre::Fiction));
        assert_eq!(Genre::parse("poetry"), None);
        assert_eq!(Genre::parse(""), None);
    }

    #[test]
    fn test_category_target_composition() {
        assert_eq!(
            CategoryTarget::resolve(Some(Genre::Fiction), Some(true)),
            Some(CategoryTarget::Exact(Category::ChildrensFiction))
        );
        assert_eq!(
            CategoryTarget::resolve(Some(Genre::Nonfiction), Some(false)),
            Some(CategoryTarget::Exact(Category::Nonfiction))
        );
        assert_eq!(
            CategoryTarget::resolve(Some(Genre::Fiction), None),
            Some(CategoryTarget::Exact(Category::Fiction))
        );
        assert_eq!(
            CategoryTarget::resolve(None, Some(true)),
            Some(CategoryTarget::AnyChildren)
        );
        assert_eq!(CategoryTarget::resolve(None, Some(false)), None);
        assert_eq!(CategoryTarget::resolve(None, None), None);
    }

    #[test]
    fn test_normalized_removes_author_tokens() {
        let spec = FilterSpec {
            author: Some(vec!["Ernest Hemingway".into()]),
            keywords: Some(vec!["Ernest Hemingway".into(), "Paris".into()]),
            ..Default::default()
        };
        assert_eq!(
            spec.normalized().keywords,
            Some(vec!["Paris".to_string()])
        );
    }

    #[test]
    fn test_normalized_removes_year_and_page_tokens() {
        let spec = FilterSpec {
            pages_min: Some(300),
            published_year: Some(PublishedYear {
                min: Some(2010),
                max: Some(2019),
                exact: None,
            }),
            keywords: Some(vec!["2019".into(), "Some Place".into(), "300".into()]),
            ..Default::default()
        };
        assert_eq!(
            spec.normalized().keywords,
            Some(vec!["Some Place".to_string()])
        );
    }

    #[test]
    fn test_normalized_dedups_case_insensitively() {
        let spec = FilterSpec {
            author: Some(vec!["someone else".into()]),
            keywords: Some(vec![
                "Paris".into(),
                "paris".into(),
                " PARIS ".into(),
                "London".into(),
            ]),
            ..Default::default()
        };
        assert_eq!(
            spec.normalized().keywords,
            Some(vec!["Paris".to_string(), "London".to_string()])
        );
    }

    #[test]
    fn test_normalized_drops_keywords_when_all_reserved() {
        let spec = FilterSpec {
            tone: Some("fear".into()),
            keywords: Some(vec!["Fear".into(), "".into()]),
            ..Default::default()
        };
        let normalized = spec.normalized();
        assert!(normalized.keywords.is_none());
        assert_eq!(normalized.tone(), Some(Tone::Fear));
    }

    #[test]
    fn test_published_year_describe() {
        let y = PublishedYear {
            min: Some(2000),
            max: None,
            exact: Some(1990),
        };
        assert_eq!(y.describe(), "exact=1990, min=2000");
    }

    #[test]
    fn test_wrong_type_drops_only_that_key() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"author": ["Stephen King"], "pages_min": "300"}"#).unwrap();
        assert_eq!(spec.authors(), Some(&["Stephen King".to_string()][..]));
        assert_eq!(spec.pages_min(), None);
        let dropped = spec.rejected("pages_min").unwrap();
        assert_eq!(dropped.value, serde_json::json!("300"));
        assert_eq!(dropped.expected, "an integer");
        assert!(!spec.is_empty());
    }

    #[test]
    fn test_bare_year_and_numeric_tone_are_rejected() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"published_year": 1990, "tone": 3, "genre": "Fiction"}"#)
                .unwrap();
        assert!(spec.published_year().is_none());
        assert!(spec.tone_text().is_none());
        assert_eq!(spec.genre(), Some(Genre::Fiction));
        let keys: Vec<&str> = spec.rejected.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["published_year", "tone"]);
    }

    #[test]
    fn test_malformed_year_bound_rejects_whole_object() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"published_year": {"min": 2000, "max": "soon"}}"#).unwrap();
        assert!(spec.published_year().is_none());
        assert!(spec.rejected("published_year").is_some());
    }

    #[test]
    fn test_lenient_numbers_and_lists() {
        let spec: FilterSpec = serde_json::from_str(
            r#"{"pages_max": 300.0, "keywords": ["a", 1], "names": ["ignored"], "extra": true}"#,
        )
        .unwrap();
        assert_eq!(spec.pages_max(), Some(300));
        assert!(spec.keywords().is_none());
        assert!(spec.rejected("keywords").is_some());
        assert_eq!(spec.rejected.len(), 1);
    }

    #[test]
    fn test_rejections_survive_normalization() {
        let spec: FilterSpec = serde_json::from_str(r#"{"children": "yes"}"#).unwrap();
        let normalized = spec.normalized();
        assert_eq!(normalized.children(), None);
        assert_eq!(normalized.rejected("children").unwrap().expected, "a boolean");
    }

    #[test]
    fn test_non_object_spec_is_an_error() {
        assert!(serde_json::from_str::<FilterSpec>("[1, 2]").is_err());
        assert!(serde_json::from_str::<FilterSpec>("null").unwrap().is_empty());
    }
}
