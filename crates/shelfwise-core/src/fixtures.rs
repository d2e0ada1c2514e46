//! Ten-book catalog shared by the unit tests.
//!
//! Categories: Fiction 4 (Orwell, King x2, Lee), Nonfiction 2 (Gladwell,
//! Bryson), Children's Fiction 3 (Rowling x2, Dahl),
//! Children's Nonfiction 1 (National Geographic Kids). The National
//! Geographic almanac has no publication year.

use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::index::{IndexHit, SemanticIndex};
use crate::models::{Category, ItemRecord, RecordTable, ToneScores};

#[allow(clippy::too_many_arguments)]
fn book(
    id: &str,
    title: &str,
    authors: &str,
    category: Category,
    pages: u32,
    year: Option<i32>,
    description: &str,
    tones: [f64; 5],
) -> ItemRecord {
    let [joy, surprise, anger, fear, sadness] = tones;
    ItemRecord {
        id: id.to_string(),
        title: title.to_string(),
        authors: authors.to_string(),
        category,
        pages: Some(pages),
        published_year: year,
        description: description.to_string(),
        tones: ToneScores {
            anger,
            disgust: 0.0,
            fear,
            joy,
            sadness,
            surprise,
            neutral: 0.0,
        },
    }
}

pub(crate) fn sample_books() -> Vec<ItemRecord> {
    vec![
        book(
            "9780451524935",
            "1984",
            "George Orwell",
            Category::Fiction,
            200,
            Some(1949),
            "A dystopian novel about a totalitarian regime that controls every aspect of life through surveillance and propaganda.",
            [0.1, 0.2, 0.4, 0.8, 0.7],
        ),
        book(
            "9780439708180",
            "Harry Potter and the Sorcerer's Stone",
            "J.K. Rowling",
            Category::ChildrensFiction,
            300,
            Some(1997),
            "A young wizard discovers his magical heritage on his eleventh birthday and begins his education at Hogwarts School of Witchcraft and Wizardry.",
            [0.9, 0.7, 0.1, 0.2, 0.1],
        ),
        book(
            "9780385121675",
            "The Shining",
            "Stephen King",
            Category::Fiction,
            400,
            Some(1977),
            "A horror novel about a writer who becomes winter caretaker at an isolated hotel and descends into madness.",
            [0.05, 0.6, 0.3, 0.95, 0.4],
        ),
        book(
            "9780062315007",
            "To Kill a Mockingbird",
            "Harper Lee",
            Category::Fiction,
            250,
            Some(1960),
            "A classic novel about racial injustice and moral growth in the American South during the 1930s.",
            [0.3, 0.4, 0.6, 0.3, 0.5],
        ),
        book(
            "9780062059925",
            "Outliers",
            "Malcolm Gladwell",
            Category::Nonfiction,
            180,
            Some(2008),
            "An exploration of what makes high-achievers different and the hidden advantages that contribute to success.",
            [0.6, 0.8, 0.1, 0.1, 0.2],
        ),
        book(
            "9780385737951",
            "Charlie and the Chocolate Factory",
            "Roald Dahl",
            Category::ChildrensFiction,
            120,
            Some(1964),
            "A delightful tale about a poor boy who wins a golden ticket to tour the most magnificent chocolate factory in the world.",
            [0.95, 0.9, 0.05, 0.1, 0.1],
        ),
        book(
            "9780439136365",
            "National Geographic Kids Almanac 2023",
            "National Geographic Kids",
            Category::ChildrensNonfiction,
            80,
            None,
            "An educational almanac packed with facts, photos, and fun activities about animals, science, geography, and world cultures.",
            [0.7, 0.5, 0.05, 0.05, 0.1],
        ),
        book(
            "9780544173767",
            "A Short History of Nearly Everything",
            "Bill Bryson",
            Category::Nonfiction,
            350,
            Some(2003),
            "A fascinating journey through science and history, explaining complex scientific concepts in an accessible and entertaining way.",
            [0.5, 0.6, 0.1, 0.1, 0.2],
        ),
        book(
            "9780307743657",
            "It",
            "Stephen King",
            Category::Fiction,
            1138,
            Some(1986),
            "A terrifying horror novel about a group of children who face an ancient evil entity in the town of Derry, Maine.",
            [0.02, 0.8, 0.4, 0.98, 0.6],
        ),
        book(
            "9780439064873",
            "Harry Potter and the Chamber of Secrets",
            "J.K. Rowling",
            Category::ChildrensFiction,
            341,
            Some(1998),
            "Harry returns to Hogwarts for his second year and faces the mystery of the Chamber of Secrets and its deadly monster.",
            [0.7, 0.8, 0.2, 0.4, 0.2],
        ),
    ]
}

pub(crate) fn sample_table() -> RecordTable {
    RecordTable::new(sample_books())
}

pub(crate) fn titles(records: &[&ItemRecord]) -> Vec<String> {
    records.iter().map(|r| r.title.clone()).collect()
}

/// Scripted index that returns fixed hits and records every call.
pub(crate) struct RecordingIndex {
    hits: Vec<IndexHit>,
    fail: bool,
    calls: Mutex<Vec<(String, usize)>>,
}

impl RecordingIndex {
    /// Hits are `"<id> ..."` documents for the given ids, in order.
    pub(crate) fn returning(ids: &[&str]) -> Self {
        Self {
            hits: ids
                .iter()
                .map(|id| IndexHit::new(format!("{} description", id)))
                .collect(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            hits: Vec::new(),
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SemanticIndex for RecordingIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<IndexHit>> {
        self.calls.lock().unwrap().push((query.to_string(), k));
        if self.fail {
            bail!("index unavailable");
        }
        Ok(self.hits.iter().take(k).cloned().collect())
    }
}
