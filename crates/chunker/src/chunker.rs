//! Chunking entry points: free text, chapters and files.

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use booksum_core::TokenCounter;
use tracing::{error, warn};

use crate::error::ChunkError;
use crate::packer::Packer;
use crate::segment::{split_paragraphs, split_sentences, FileParagraphs};
use crate::types::{Chunk, OversizePolicy, CHAPTER_SEPARATOR, PARAGRAPH_SEPARATOR};

/// Granularity of the units a stream feeds to the packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Chapter,
    Paragraph,
}

/// Splits documents into chunks of at most `max_tokens` tokens.
///
/// A chunker is tied to the token limit it was built with; rebuild it when
/// the budget that limit came from changes.
#[derive(Clone)]
pub struct TextChunker {
    counter: Arc<dyn TokenCounter>,
    max_tokens: usize,
    policy: Option<OversizePolicy>,
}

impl TextChunker {
    pub fn new(counter: Arc<dyn TokenCounter>, max_tokens: usize) -> Self {
        Self {
            counter,
            max_tokens,
            policy: None,
        }
    }

    /// Use `policy` for oversized units in every mode instead of the
    /// per-mode default (file: [`OversizePolicy::Fail`], text and chapters:
    /// [`OversizePolicy::Subdivide`]).
    pub fn with_oversize_policy(mut self, policy: OversizePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Chunk free text. Paragraphs are blank-line delimited.
    pub fn chunk_text<'a>(&self, text: &'a str, doc_id: &str) -> ChunkStream<'a> {
        // Boundaries are found up front; chunks are still produced lazily.
        let paragraphs: Vec<&'a str> = split_paragraphs(text).collect();
        let units = paragraphs.into_iter().map(|p| Ok(p.to_string()));
        self.stream(
            Box::new(units),
            Level::Paragraph,
            PARAGRAPH_SEPARATOR,
            doc_id,
            OversizePolicy::Subdivide,
        )
    }

    /// Chunk an ordered list of chapters. Whole chapters are packed together
    /// and joined by a blank line.
    pub fn chunk_chapters<'a, S: AsRef<str> + Sync>(
        &self,
        chapters: &'a [S],
        doc_id: &str,
    ) -> ChunkStream<'a> {
        let units = chapters
            .iter()
            .map(|c| c.as_ref().trim())
            .filter(|c| !c.is_empty())
            .map(|c| Ok(c.to_string()));
        self.stream(
            Box::new(units),
            Level::Chapter,
            CHAPTER_SEPARATOR,
            doc_id,
            OversizePolicy::Subdivide,
        )
    }

    /// Chunk a UTF-8 text file, streaming it paragraph by paragraph. The
    /// document id of every chunk is the file path.
    pub fn chunk_file(&self, path: impl AsRef<Path>) -> Result<ChunkStream<'static>, ChunkError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let units = FileParagraphs::new(BufReader::new(file));
        Ok(self.stream(
            Box::new(units),
            Level::Paragraph,
            PARAGRAPH_SEPARATOR,
            &path.display().to_string(),
            OversizePolicy::Fail,
        ))
    }

    fn stream<'a>(
        &self,
        units: Box<dyn Iterator<Item = Result<String, ChunkError>> + Send + 'a>,
        level: Level,
        separator: &'static str,
        doc_id: &str,
        default_policy: OversizePolicy,
    ) -> ChunkStream<'a> {
        ChunkStream {
            units,
            level,
            policy: self.policy.unwrap_or(default_policy),
            packer: Packer::new(
                self.counter.clone(),
                self.max_tokens,
                doc_id.to_string(),
                separator,
            ),
            pending: VecDeque::new(),
            failure: None,
            done: false,
        }
    }
}

/// Lazy, single-pass sequence of chunks. Re-invoke the chunker to chunk again.
///
/// Yields `Err` at most once, after every chunk closed before the failure;
/// the stream is exhausted afterwards.
pub struct ChunkStream<'a> {
    units: Box<dyn Iterator<Item = Result<String, ChunkError>> + Send + 'a>,
    level: Level,
    policy: OversizePolicy,
    packer: Packer,
    pending: VecDeque<Chunk>,
    failure: Option<ChunkError>,
    done: bool,
}

impl ChunkStream<'_> {
    fn feed(&mut self, unit: &str, level: Level) -> Result<(), ChunkError> {
        let tokens = self.packer.count(unit);
        if tokens <= self.packer.max_tokens() {
            if let Some(chunk) = self.packer.push_segment(unit, tokens) {
                self.pending.push_back(chunk);
            }
            return Ok(());
        }

        if self.policy == OversizePolicy::Fail {
            error!(
                doc_id = %self.packer.document_id(),
                tokens,
                max_tokens = self.packer.max_tokens(),
                "unit exceeds the chunk limit"
            );
            return Err(self.too_large(tokens));
        }

        match level {
            Level::Chapter => {
                warn!(
                    doc_id = %self.packer.document_id(),
                    tokens,
                    max_tokens = self.packer.max_tokens(),
                    "chapter exceeds the chunk limit, chunking it by paragraph"
                );
                for paragraph in split_paragraphs(unit) {
                    self.feed(paragraph, Level::Paragraph)?;
                }
            }
            Level::Paragraph => {
                warn!(
                    doc_id = %self.packer.document_id(),
                    tokens,
                    max_tokens = self.packer.max_tokens(),
                    "paragraph exceeds the chunk limit, chunking it by sentence"
                );
                for sentence in split_sentences(unit) {
                    let sentence_tokens = self.packer.count(sentence);
                    if sentence_tokens > self.packer.max_tokens() {
                        error!(
                            doc_id = %self.packer.document_id(),
                            tokens = sentence_tokens,
                            max_tokens = self.packer.max_tokens(),
                            "skipping sentence longer than the chunk limit"
                        );
                        continue;
                    }
                    if let Some(chunk) = self.packer.push_sentence(sentence, sentence_tokens) {
                        self.pending.push_back(chunk);
                    }
                }
                self.packer.end_paragraph();
            }
        }
        Ok(())
    }

    fn too_large(&self, tokens: usize) -> ChunkError {
        ChunkError::ChunkTooLarge {
            tokens,
            max_tokens: self.packer.max_tokens(),
            document_id: self.packer.document_id().to_string(),
        }
    }
}

impl Iterator for ChunkStream<'_> {
    type Item = Result<Chunk, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chunk) = self.pending.pop_front() {
                return Some(Ok(chunk));
            }
            if let Some(e) = self.failure.take() {
                return Some(Err(e));
            }
            if self.done {
                return None;
            }
            match self.units.next() {
                Some(Ok(unit)) => {
                    let level = self.level;
                    if let Err(e) = self.feed(&unit, level) {
                        self.failure = Some(e);
                        self.done = true;
                    }
                }
                Some(Err(e)) => {
                    self.failure = Some(e);
                    self.done = true;
                }
                None => {
                    self.done = true;
                    if let Some(chunk) = self.packer.close() {
                        self.pending.push_back(chunk);
                    }
                }
            }
        }
    }
}
