use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("unit of {tokens} tokens in '{document_id}' exceeds the chunk limit of {max_tokens}")]
    ChunkTooLarge {
        tokens: usize,
        max_tokens: usize,
        document_id: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
