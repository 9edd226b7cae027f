//! Chunk output type and oversize policy.

/// Joins the segments of a chunk produced from free text or a file.
pub const PARAGRAPH_SEPARATOR: &str = "\n";

/// Joins the segments of a chunk produced from a list of chapters.
pub const CHAPTER_SEPARATOR: &str = "\n\n";

/// What to do with a unit whose own token count exceeds the chunk limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OversizePolicy {
    /// Abort chunking with [`crate::ChunkError::ChunkTooLarge`].
    Fail,
    /// Split the unit one granularity finer (chapter → paragraphs →
    /// sentences). A sentence that still does not fit is logged and skipped.
    Subdivide,
}

/// An ordered, immutable bundle of text units treated as one summarization unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    id: usize,
    token_count: usize,
    document_id: String,
    segments: Box<[String]>,
    separator: &'static str,
}

impl Chunk {
    pub(crate) fn new(
        id: usize,
        token_count: usize,
        document_id: String,
        segments: Vec<String>,
        separator: &'static str,
    ) -> Self {
        Self {
            id,
            token_count,
            document_id,
            segments: segments.into_boxed_slice(),
            separator,
        }
    }

    /// 1-based position within the chunking run that produced this chunk.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Token count of [`Chunk::text`].
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// File path, chapter or book id, or `"n/a"`.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// All segments joined by the chunk's separator.
    pub fn text(&self) -> String {
        self.segments.join(self.separator)
    }
}
