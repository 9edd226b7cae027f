use booksum_chunker::ChunkError;
use booksum_core::{BudgetError, TokenizerError};
use booksum_llm::{LlmError, SummarizeError};
use thiserror::Error;

use crate::prompts::PromptError;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("chunking failed: {0}")]
    Chunking(#[from] ChunkError),

    #[error("summarization with {model} failed: {source}")]
    CapabilityFailure {
        model: String,
        #[source]
        source: SummarizeError,
    },

    #[error("intro/conclusion not found in model response: {0}")]
    MalformedSynthesisResponse(&'static str),

    #[error("book is too long for the primary model and no secondary model is configured")]
    MissingSecondary,

    #[error("invalid token budget: {0}")]
    Budget(#[from] BudgetError),

    #[error("prompt templates: {0}")]
    Prompt(#[from] PromptError),

    #[error("tokenizer: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("provider: {0}")]
    Provider(#[from] LlmError),

    #[error("summarization worker failed: {0}")]
    Worker(String),
}

impl SummarizerError {
    /// Short name of the failure, safe to show to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chunking(ChunkError::ChunkTooLarge { .. }) => "ChunkTooLarge",
            Self::Chunking(ChunkError::Io(_)) => "Io",
            Self::CapabilityFailure { .. } => "CapabilityFailure",
            Self::MalformedSynthesisResponse(_) => "MalformedSynthesisResponse",
            Self::MissingSecondary => "MissingSecondary",
            Self::Budget(_) => "Budget",
            Self::Prompt(_) => "Prompt",
            Self::Tokenizer(_) => "Tokenizer",
            Self::Provider(_) => "Provider",
            Self::Worker(_) => "Worker",
        }
    }
}
