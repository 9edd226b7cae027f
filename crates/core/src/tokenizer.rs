//! Token counting.
//!
//! Every component that reasons about token limits goes through the single
//! [`TokenCounter`] trait, so the count recorded on a chunk always matches a
//! later re-count of the same text.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

use crate::error::TokenizerError;

/// Counts tokens in a piece of text. Must be deterministic and pure.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// Which counting scheme to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// `cl100k_base`, used by the gpt-3.5/gpt-4 family.
    Cl100k,
    /// `r50k_base`, the legacy GPT-2/GPT-3 encoding.
    R50k,
    /// One token per whitespace-separated word.
    Whitespace,
}

impl FromStr for TokenizerKind {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k" | "cl100k_base" | "current" => Ok(Self::Cl100k),
            "r50k" | "r50k_base" | "gpt2" | "legacy" => Ok(Self::R50k),
            "whitespace" | "words" => Ok(Self::Whitespace),
            other => Err(TokenizerError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cl100k => "cl100k",
            Self::R50k => "r50k",
            Self::Whitespace => "whitespace",
        };
        f.write_str(name)
    }
}

impl TokenizerKind {
    /// Build the counter for this scheme. BPE tables are loaded eagerly.
    pub fn build(self) -> Result<Arc<dyn TokenCounter>, TokenizerError> {
        Ok(match self {
            Self::Cl100k => Arc::new(BpeCounter::cl100k()?),
            Self::R50k => Arc::new(BpeCounter::r50k()?),
            Self::Whitespace => Arc::new(WhitespaceCounter),
        })
    }
}

/// Byte-pair-encoding counter backed by `tiktoken-rs`.
pub struct BpeCounter {
    bpe: CoreBPE,
}

impl BpeCounter {
    pub fn cl100k() -> Result<Self, TokenizerError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| TokenizerError::Load {
            encoding: "cl100k_base",
            reason: e.to_string(),
        })?;
        Ok(Self { bpe })
    }

    pub fn r50k() -> Result<Self, TokenizerError> {
        let bpe = tiktoken_rs::r50k_base().map_err(|e| TokenizerError::Load {
            encoding: "r50k_base",
            reason: e.to_string(),
        })?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for BpeCounter {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Approximate token count via whitespace splitting.
pub struct WhitespaceCounter;

impl TokenCounter for WhitespaceCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT1: &str = "The number of tokens processed in a given API request depends on the length of both your inputs and outputs. As a rough rule of thumb, 1 token is approximately 4 characters or 0.75 words for English text.";
    const TEXT2: &str = "One limitation to keep in mind is that your text prompt and generated completion combined must be no more than the model's maximum context length";

    #[test]
    fn whitespace_counts_words() {
        let counter = WhitespaceCounter;
        assert_eq!(counter.count_tokens(""), 0);
        assert_eq!(counter.count_tokens("\n"), 0);
        assert_eq!(counter.count_tokens("  hello \n\n world  "), 2);
    }

    #[test]
    fn cl100k_counts() {
        let counter = BpeCounter::cl100k().unwrap();
        assert_eq!(counter.count_tokens(""), 0);
        assert_eq!(counter.count_tokens(TEXT1), 46);
        assert_eq!(counter.count_tokens(TEXT2), 26);
    }

    #[test]
    fn r50k_counts() {
        let counter = BpeCounter::r50k().unwrap();
        assert_eq!(counter.count_tokens(TEXT1), 43);
        assert_eq!(counter.count_tokens(TEXT2), 26);
    }

    #[test]
    fn counting_is_deterministic() {
        let counter = TokenizerKind::Cl100k.build().unwrap();
        assert_eq!(counter.count_tokens(TEXT1), counter.count_tokens(TEXT1));
    }

    #[test]
    fn kind_parses_aliases() {
        assert_eq!("cl100k".parse::<TokenizerKind>().unwrap(), TokenizerKind::Cl100k);
        assert_eq!("GPT2".parse::<TokenizerKind>().unwrap(), TokenizerKind::R50k);
        assert_eq!("words".parse::<TokenizerKind>().unwrap(), TokenizerKind::Whitespace);
        assert!("sentencepiece".parse::<TokenizerKind>().is_err());
    }
}
