use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use booksum_chunker::{Chunk, OversizePolicy, TextChunker};
use booksum_core::{Book, Config, TokenCounter};
use booksum_summarizer::build_summarizer;

pub async fn summarize_text_file(config: &Config, file: &Path) -> Result<String> {
    let summarizer = build_summarizer(config).context("failed to initialize the summarizer")?;
    info!(file = %file.display(), "summarizing text file");
    let summary = summarizer
        .summarize_file(file)
        .await
        .with_context(|| format!("failed to summarize {}", file.display()))?;
    Ok(summary)
}

pub async fn summarize_book_file(config: &Config, file: &Path) -> Result<String> {
    let book = load_book(file)?;
    let summarizer = build_summarizer(config).context("failed to initialize the summarizer")?;
    let chapters = book.sorted_texts();
    let summary = summarizer
        .summarize_chapters(&chapters, &book.book_id)
        .await
        .with_context(|| format!("failed to summarize book {}", book.book_id))?;

    let mut output = serde_json::to_value(&summary)?;
    output["book_id"] = serde_json::Value::String(book.book_id);
    Ok(serde_json::to_string_pretty(&output)?)
}

pub fn load_book(file: &Path) -> Result<Book> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let book: Book = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a valid book JSON", file.display()))?;
    anyhow::ensure!(!book.chapters.is_empty(), "{} has no chapters", file.display());
    Ok(book)
}

/// Effective configuration as pretty JSON. The API key is never included.
pub fn config_report(config: &Config) -> Result<String> {
    Ok(serde_json::to_string_pretty(&config.redacted_summary())?)
}

pub fn chunk_report(
    counter: Arc<dyn TokenCounter>,
    file: &Path,
    max_tokens: usize,
    subdivide: bool,
) -> Result<String> {
    let mut chunker = TextChunker::new(counter, max_tokens);
    if subdivide {
        chunker = chunker.with_oversize_policy(OversizePolicy::Subdivide);
    }
    let chunks: Vec<Chunk> = chunker
        .chunk_file(file)?
        .collect::<Result<_, _>>()
        .with_context(|| format!("failed to chunk {}", file.display()))?;

    let mut report = String::new();
    writeln!(report, "id\ttokens\tsegments\tpreview")?;
    for chunk in &chunks {
        writeln!(
            report,
            "{}\t{}\t{}\t{}",
            chunk.id(),
            chunk.token_count(),
            chunk.segments().len(),
            preview(&chunk.text(), 60)
        )?;
    }
    let total: usize = chunks.iter().map(Chunk::token_count).sum();
    writeln!(report, "{} chunks, {} tokens, limit {}", chunks.len(), total, max_tokens)?;
    Ok(report)
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{cut}...")
}
