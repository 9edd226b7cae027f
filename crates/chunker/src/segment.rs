//! Paragraph and sentence boundaries.

use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::ChunkError;

/// Two or more newlines, Windows or Unix style.
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n){2,}").expect("paragraph regex is valid"));

/// Split text on blank lines. Paragraphs are trimmed; whitespace-only
/// paragraphs are dropped.
pub fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

/// Split a paragraph at Unicode (UAX #29) sentence boundaries. Every
/// non-whitespace character of the input lands in exactly one sentence.
pub fn split_sentences(paragraph: &str) -> Vec<&str> {
    paragraph
        .split_sentence_bounds()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Streams paragraphs from a line-oriented reader. A blank (or
/// whitespace-only) line ends a paragraph; the lines of one paragraph are
/// re-joined with `\n`.
pub struct FileParagraphs<R> {
    lines: std::io::Lines<R>,
    done: bool,
}

impl<R: BufRead> FileParagraphs<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for FileParagraphs<R> {
    type Item = Result<String, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut paragraph: Vec<String> = Vec::new();
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        if !paragraph.is_empty() {
                            return Some(Ok(paragraph.join("\n")));
                        }
                    } else {
                        paragraph.push(line);
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.done = true;
                    return if paragraph.is_empty() {
                        None
                    } else {
                        Some(Ok(paragraph.join("\n")))
                    };
                }
            }
        }
    }
}
