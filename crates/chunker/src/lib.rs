//! Greedy, boundary-aware text segmenter.
//!
//! Packs paragraphs, sentences or whole chapters into token-bounded
//! [`Chunk`]s without ever reordering or cutting a unit. Three entry points
//! share one bin-packing core: free text, a list of chapters, and a file read
//! paragraph by paragraph.

mod chunker;
mod error;
mod packer;
mod segment;
mod types;

pub use chunker::{ChunkStream, TextChunker};
pub use error::ChunkError;
pub use segment::{split_paragraphs, split_sentences, FileParagraphs};
pub use types::{Chunk, OversizePolicy, CHAPTER_SEPARATOR, PARAGRAPH_SEPARATOR};
