//! Core data models used throughout shelfwise.
//!
//! These types describe the book catalog: one [`ItemRecord`] per book, held
//! read-only in a [`RecordTable`] for the duration of a request.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Catalog category label.
///
/// "Children" is not a separate field; it is encoded as a category-name
/// prefix, so filters must compose it rather than query it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Fiction")]
    Fiction,
    #[serde(rename = "Nonfiction", alias = "Non-Fiction")]
    Nonfiction,
    #[serde(rename = "Children's Fiction")]
    ChildrensFiction,
    #[serde(rename = "Children's Nonfiction", alias = "Children's Non-Fiction")]
    ChildrensNonfiction,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Fiction,
        Category::Nonfiction,
        Category::ChildrensFiction,
        Category::ChildrensNonfiction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Fiction => "Fiction",
            Category::Nonfiction => "Nonfiction",
            Category::ChildrensFiction => "Children's Fiction",
            Category::ChildrensNonfiction => "Children's Nonfiction",
        }
    }

    pub fn is_children(self) -> bool {
        matches!(
            self,
            Category::ChildrensFiction | Category::ChildrensNonfiction
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed emotional-tone vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Anger,
    Disgust,
    Fear,
    Joy,
    Sadness,
    Surprise,
    Neutral,
}

impl Tone {
    pub const ALL: [Tone; 7] = [
        Tone::Anger,
        Tone::Disgust,
        Tone::Fear,
        Tone::Joy,
        Tone::Sadness,
        Tone::Surprise,
        Tone::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Anger => "anger",
            Tone::Disgust => "disgust",
            Tone::Fear => "fear",
            Tone::Joy => "joy",
            Tone::Sadness => "sadness",
            Tone::Surprise => "surprise",
            Tone::Neutral => "neutral",
        }
    }

    /// Parse a tone name, case-insensitively.
    ///
    /// Accepts the seven canonical names plus the mood labels offered by
    /// the older dashboard (`happy`, `surprising`, `angry`, `suspenseful`,
    /// `sad`). Anything else is unrecognized.
    pub fn parse(text: &str) -> Option<Tone> {
        match text.trim().to_lowercase().as_str() {
            "anger" | "angry" => Some(Tone::Anger),
            "disgust" => Some(Tone::Disgust),
            "fear" | "suspenseful" => Some(Tone::Fear),
            "joy" | "happy" => Some(Tone::Joy),
            "sadness" | "sad" => Some(Tone::Sadness),
            "surprise" | "surprising" => Some(Tone::Surprise),
            "neutral" => Some(Tone::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-record tone intensities in `[0, 1]`. Independent; they need not sum to 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneScores {
    #[serde(default)]
    pub anger: f64,
    #[serde(default)]
    pub disgust: f64,
    #[serde(default)]
    pub fear: f64,
    #[serde(default)]
    pub joy: f64,
    #[serde(default)]
    pub sadness: f64,
    #[serde(default)]
    pub surprise: f64,
    #[serde(default)]
    pub neutral: f64,
}

impl ToneScores {
    pub fn get(&self, tone: Tone) -> f64 {
        match tone {
            Tone::Anger => self.anger,
            Tone::Disgust => self.disgust,
            Tone::Fear => self.fear,
            Tone::Joy => self.joy,
            Tone::Sadness => self.sadness,
            Tone::Surprise => self.surprise,
            Tone::Neutral => self.neutral,
        }
    }
}

/// One catalog entry.
///
/// Field names on the wire follow the books table columns (`isbn13`,
/// `simple_categories`, `num_pages`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "isbn13", deserialize_with = "string_or_integer")]
    pub id: String,
    pub title: String,
    /// Free-text author list, possibly several names joined by a separator.
    #[serde(default)]
    pub authors: String,
    #[serde(rename = "simple_categories")]
    pub category: Category,
    #[serde(rename = "num_pages", default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub tones: ToneScores,
}

impl ItemRecord {
    /// The document text handed to a semantic index: identifier first.
    pub fn tagged_description(&self) -> String {
        format!("{} {}", self.id, self.description)
    }
}

fn string_or_integer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

/// Immutable, request-scoped catalog.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    records: Vec<ItemRecord>,
}

impl RecordTable {
    pub fn new(records: Vec<ItemRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ItemRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ItemRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by identifier.
    pub fn get(&self, id: &str) -> Option<&ItemRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}
