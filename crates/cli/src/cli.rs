use std::path::PathBuf;

use clap::{Parser, Subcommand};

use booksum_core::TokenizerKind;

/// Offline book and text summarizer.
///
/// Model, budget and rate-limit settings come from the environment (and a
/// `.env` file), the same way the server reads them.
#[derive(Parser, Debug)]
#[command(name = "booksum", version, about = "Summarize books and long texts")]
pub struct CliArgs {
    /// Config profile; `{PROFILE}_{KEY}` env vars win over `{KEY}`
    #[arg(long, env = "BOOKSUM_PROFILE", default_value = "")]
    pub profile: String,

    /// Token counting scheme override: cl100k, r50k or whitespace
    #[arg(long)]
    pub tokenizer: Option<TokenizerKind>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize a plain-text file chunk by chunk
    Text {
        file: PathBuf,

        /// Write the summary here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Summarize a book JSON file: {"book_id": ..., "chapters": [{"id": .., "text": ..}]}
    Book {
        file: PathBuf,

        /// Write the summary JSON here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print how a text file would be chunked, without calling any model
    Chunks {
        file: PathBuf,

        /// Chunk limit in tokens
        #[arg(long, default_value_t = 1000)]
        max_tokens: usize,

        /// Split oversized paragraphs at sentences instead of failing
        #[arg(long)]
        subdivide: bool,
    },

    /// Print the effective configuration as JSON, with secrets redacted
    Config,
}
