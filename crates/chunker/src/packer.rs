//! Greedy bin-packing shared by every chunking mode.

use std::sync::Arc;

use booksum_core::TokenCounter;

use crate::types::Chunk;

/// Accumulates units into the current chunk and closes it when the next unit
/// would overflow the limit.
///
/// Two kinds of units are packed: whole segments (paragraphs or chapters,
/// joined by the mode's separator) and sentences of a subdivided paragraph,
/// which are gathered into a single segment joined by spaces.
pub(crate) struct Packer {
    counter: Arc<dyn TokenCounter>,
    max_tokens: usize,
    document_id: String,
    separator: &'static str,
    separator_tokens: usize,
    space_tokens: usize,
    next_id: usize,
    running_tokens: usize,
    segments: Vec<String>,
    sentences: Vec<String>,
}

impl Packer {
    pub(crate) fn new(
        counter: Arc<dyn TokenCounter>,
        max_tokens: usize,
        document_id: String,
        separator: &'static str,
    ) -> Self {
        let separator_tokens = counter.count_tokens(separator);
        let space_tokens = counter.count_tokens(" ");
        Self {
            counter,
            max_tokens,
            document_id,
            separator,
            separator_tokens,
            space_tokens,
            next_id: 1,
            running_tokens: 0,
            segments: Vec::new(),
            sentences: Vec::new(),
        }
    }

    pub(crate) fn count(&self, text: &str) -> usize {
        self.counter.count_tokens(text)
    }

    pub(crate) fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub(crate) fn document_id(&self) -> &str {
        &self.document_id
    }

    fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.sentences.is_empty()
    }

    /// Add a whole segment of `tokens` tokens. Returns the chunk closed to
    /// make room for it, if any.
    pub(crate) fn push_segment(&mut self, segment: &str, tokens: usize) -> Option<Chunk> {
        let cost = if self.is_empty() {
            tokens
        } else {
            tokens + self.separator_tokens
        };
        if self.running_tokens + cost > self.max_tokens {
            let closed = self.close();
            self.segments.push(segment.to_string());
            self.running_tokens = tokens;
            return closed;
        }
        self.flush_sentences();
        self.segments.push(segment.to_string());
        self.running_tokens += cost;
        None
    }

    /// Add one sentence of a subdivided paragraph.
    pub(crate) fn push_sentence(&mut self, sentence: &str, tokens: usize) -> Option<Chunk> {
        let cost = if !self.sentences.is_empty() {
            tokens + self.space_tokens
        } else if !self.segments.is_empty() {
            tokens + self.separator_tokens
        } else {
            tokens
        };
        if self.running_tokens + cost > self.max_tokens {
            let closed = self.close();
            self.sentences.push(sentence.to_string());
            self.running_tokens = tokens;
            return closed;
        }
        self.sentences.push(sentence.to_string());
        self.running_tokens += cost;
        None
    }

    /// Seal the sentences gathered so far into one segment, so the next
    /// subdivided paragraph starts a segment of its own.
    pub(crate) fn end_paragraph(&mut self) {
        self.flush_sentences();
    }

    /// Close the current chunk, if it holds anything.
    pub(crate) fn close(&mut self) -> Option<Chunk> {
        self.flush_sentences();
        if self.segments.is_empty() {
            return None;
        }
        let segments = std::mem::take(&mut self.segments);
        let text = segments.join(self.separator);
        let token_count = self.counter.count_tokens(&text);
        let chunk = Chunk::new(
            self.next_id,
            token_count,
            self.document_id.clone(),
            segments,
            self.separator,
        );
        self.next_id += 1;
        self.running_tokens = 0;
        Some(chunk)
    }

    fn flush_sentences(&mut self) {
        if !self.sentences.is_empty() {
            let joined = std::mem::take(&mut self.sentences).join(" ");
            self.segments.push(joined);
        }
    }
}
