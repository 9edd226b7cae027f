//! Book and text summarization on top of the chunker and the summary models.

pub mod error;
pub mod factory;
pub mod orchestrator;
pub mod pool;
pub mod prompts;
pub mod synthesis;

pub use error::SummarizerError;
pub use factory::build_summarizer;
pub use orchestrator::{adaptive_ratio, target_word_count, BookSummarizer};
pub use pool::WorkerPool;
pub use prompts::{PromptError, PromptTemplates};
pub use synthesis::{parse_intro_conclusion, IntroConclusion};
