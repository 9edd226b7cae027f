use serde::{Deserialize, Serialize};

/// Document id used when the caller does not provide one.
pub const UNKNOWN_DOC_ID: &str = "n/a";

/// One chapter of a book, as received from callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    pub id: i64,
    pub text: String,
}

/// A book: an ordered list of chapters plus an identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    #[serde(default = "unknown_doc_id")]
    pub book_id: String,
    pub chapters: Vec<Chapter>,
}

fn unknown_doc_id() -> String {
    UNKNOWN_DOC_ID.to_string()
}

impl Book {
    /// Chapter texts ordered by chapter id. Callers may send chapters in any
    /// order; summarization always sees them sorted.
    pub fn sorted_texts(&self) -> Vec<String> {
        sorted_chapter_texts(self.chapters.clone())
    }
}

/// Sort chapters by id and return their texts.
pub fn sorted_chapter_texts(mut chapters: Vec<Chapter>) -> Vec<String> {
    chapters.sort_by_key(|c| c.id);
    chapters.into_iter().map(|c| c.text).collect()
}

/// Final output of a book summarization run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookSummary {
    pub intro: String,
    pub summary: String,
    pub conclusion: String,
}
