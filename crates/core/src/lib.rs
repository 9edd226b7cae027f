pub mod budget;
pub mod config;
pub mod document;
pub mod error;
pub mod tokenizer;

pub use budget::TokenBudget;
pub use config::Config;
pub use document::*;
pub use error::*;
pub use tokenizer::{TokenCounter, TokenizerKind};
