//! Validation ledger: the audit trail of every constraint application.
//!
//! One entry per requested constraint, keyed by its application key
//! (`applied_author`, `applied_genre`, ...), kept in application order.
//! Entries are written once and never removed; the ledger is returned to
//! the caller verbatim alongside the ranked records.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Outcome of a constraint's self-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

/// Record of a single constraint application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    /// False when the constraint was present but ignored (unrecognized or
    /// contradictory value).
    pub applied: bool,
    pub num_books_before: usize,
    pub num_books_after: usize,
    pub filter_value: serde_json::Value,
    pub status: Status,
    pub message: String,
}

impl LedgerEntry {
    /// Entry for a constraint that was requested but not applied.
    pub fn ignored(filter_value: serde_json::Value, count: usize, message: String) -> Self {
        Self {
            applied: false,
            num_books_before: count,
            num_books_after: count,
            filter_value,
            status: Status::Success,
            message,
        }
    }
}

/// Ordered, write-once map from ledger key to [`LedgerEntry`].
///
/// Serializes as a JSON object whose keys appear in application order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationLedger {
    entries: Vec<(String, LedgerEntry)>,
}

impl ValidationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the entry for `key`.
    ///
    /// Each key has a single writer; a second write for the same key is
    /// dropped so the first recorded outcome stands.
    pub fn record(&mut self, key: &str, entry: LedgerEntry) {
        if self.get(key).is_some() {
            tracing::warn!(key, "ledger key already recorded; keeping first entry");
            return;
        }
        self.entries.push((key.to_string(), entry));
    }

    /// Append `note` to the message of the entry already recorded for `key`.
    pub fn annotate(&mut self, key: &str, note: &str) {
        if let Some((_, entry)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.message.push(' ');
            entry.message.push_str(note);
        }
    }

    pub fn get(&self, key: &str) -> Option<&LedgerEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, entry)| entry)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LedgerEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose self-check failed.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &LedgerEntry)> {
        self.iter().filter(|(_, e)| e.status == Status::Failed)
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

impl Serialize for ValidationLedger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}
