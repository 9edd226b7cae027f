//! Hierarchical map/reduce over a book or a single text.
//!
//! A book goes through up to three stages:
//!
//! 1. **Adaptive reduce**: when the joined chapters do not fit the primary
//!    model's prompt, a stage-local copy of the secondary model gets a ratio
//!    that should shrink the book to fit, and maps over chapter chunks.
//! 2. **Refine**: if the reduced text still does not fit, it is re-chunked with
//!    the primary chunker and mapped once more by the primary model. Otherwise
//!    it is condensed in one call, or kept verbatim when already short.
//! 3. **Synthesize**: one more primary call writes the intro and conclusion.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use booksum_chunker::{Chunk, TextChunker, CHAPTER_SEPARATOR};
use booksum_core::config::OrchestratorConfig;
use booksum_core::{BookSummary, BudgetError, TokenCounter};
use booksum_llm::SummaryModel;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::SummarizerError;
use crate::pool::WorkerPool;
use crate::prompts::PromptTemplates;
use crate::synthesis::parse_intro_conclusion;

/// Joins partial summaries produced by a concurrent map.
const SUMMARY_SEPARATOR: &str = "\n\n";

/// Chunks read ahead of the summarizer in file mode.
const FILE_CHUNK_BUFFER: usize = 2;

/// Safety margin subtracted from the ideal adaptive ratio.
const ADAPTIVE_MARGIN: f64 = 0.05;
/// Lowest ratio the adaptive stage will ask for.
const MIN_ADAPTIVE_RATIO: f64 = 0.01;

/// Words per token used to turn a token target into a word target.
const WORDS_PER_TOKEN: f64 = 0.68;
/// Words per token used to decide whether a text is worth condensing.
const CONDENSE_WORDS_PER_TOKEN: f64 = 0.75;

/// Ratio that should bring `total_tokens` under `max_prompt_tokens`.
pub fn adaptive_ratio(max_prompt_tokens: usize, total_tokens: usize) -> f64 {
    if total_tokens == 0 {
        return 1.0;
    }
    let ideal = max_prompt_tokens as f64 / total_tokens as f64;
    (ideal - ADAPTIVE_MARGIN).max(MIN_ADAPTIVE_RATIO)
}

/// Summary length, in words, to request for a chunk of `chunk_tokens`.
pub fn target_word_count(chunk_tokens: usize, sum_ratio: f64, min_words: usize) -> usize {
    let summary_tokens = (sum_ratio * chunk_tokens as f64) as usize;
    let words = (WORDS_PER_TOKEN * summary_tokens as f64) as usize;
    words.max(min_words)
}

fn primary_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .ok()
        .filter(|n| *n > 1)
        .unwrap_or(4)
}

/// Summarize one chunk with `model`, asking for a summary proportional to
/// the model's ratio.
async fn summarize_chunk(
    model: &SummaryModel,
    prompts: &PromptTemplates,
    chunk: &Chunk,
    min_words: usize,
) -> Result<String, SummarizerError> {
    let words = target_word_count(chunk.token_count(), model.sum_ratio(), min_words);
    info!(
        model = %model.model_name(),
        chunk_id = chunk.id(),
        doc_id = %chunk.document_id(),
        tokens = chunk.token_count(),
        target_words = words,
        "summarizing chunk"
    );
    let prompt = prompts.render_summary(words, &chunk.text());
    let summary = model
        .summarize(&prompt)
        .await
        .map_err(|source| SummarizerError::CapabilityFailure {
            model: model.model_name().to_string(),
            source,
        })?;
    info!(
        model = %model.model_name(),
        chunk_id = chunk.id(),
        words = summary.split_whitespace().count(),
        "received chunk summary"
    );
    Ok(summary)
}

/// Drives one summarization request. Holds no per-request state, so one
/// instance can serve concurrent requests.
pub struct BookSummarizer {
    primary: SummaryModel,
    secondary: Option<SummaryModel>,
    prompts: Arc<PromptTemplates>,
    counter: Arc<dyn TokenCounter>,
    settings: OrchestratorConfig,
    summary_prompt_tokens: usize,
    chunker: TextChunker,
}

impl BookSummarizer {
    pub fn new(
        primary: SummaryModel,
        secondary: Option<SummaryModel>,
        prompts: PromptTemplates,
        counter: Arc<dyn TokenCounter>,
        settings: OrchestratorConfig,
    ) -> Result<Self, SummarizerError> {
        let summary_prompt_tokens = counter.count_tokens(prompts.summary_template());
        let chunker = TextChunker::new(
            counter.clone(),
            chunk_limit(&primary, summary_prompt_tokens)?,
        );
        info!(
            primary = %primary.model_name(),
            secondary = secondary.as_ref().map(|s| s.model_name()).unwrap_or("none"),
            chunk_tokens = chunker.max_tokens(),
            "summarizer ready"
        );
        Ok(Self {
            primary,
            secondary,
            prompts: Arc::new(prompts),
            counter,
            settings,
            summary_prompt_tokens,
            chunker,
        })
    }

    pub fn primary(&self) -> &SummaryModel {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&SummaryModel> {
        self.secondary.as_ref()
    }

    /// Chunk limit of the primary chunker.
    pub fn chunk_tokens(&self) -> usize {
        self.chunker.max_tokens()
    }

    // ── Single document ─────────────────────────────────────────────

    /// Summarize free text chunk by chunk, one call at a time, joining the
    /// chunk summaries with a space.
    pub async fn summarize_text(&self, text: &str, doc_id: &str) -> Result<String, SummarizerError> {
        let mut summaries = Vec::new();
        for chunk in self.chunker.chunk_text(text, doc_id) {
            let chunk = chunk?;
            summaries.push(self.summarize_primary(&chunk).await?);
        }
        Ok(summaries.join(" "))
    }

    /// Like [`summarize_text`](Self::summarize_text), streaming the file
    /// paragraph by paragraph. File reads run on the blocking pool and hand
    /// chunks over one at a time.
    pub async fn summarize_file(&self, path: impl AsRef<Path>) -> Result<String, SummarizerError> {
        let chunker = self.chunker.clone();
        let path = path.as_ref().to_path_buf();
        let (tx, mut rx) = mpsc::channel(FILE_CHUNK_BUFFER);

        let reader = tokio::task::spawn_blocking(move || {
            let stream = match chunker.chunk_file(&path) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = tx.blocking_send(Err(e));
                    return;
                }
            };
            for chunk in stream {
                // receiver gone: the summarizer already failed
                if tx.blocking_send(chunk).is_err() {
                    break;
                }
            }
        });

        let mut summaries = Vec::new();
        while let Some(chunk) = rx.recv().await {
            let chunk = chunk?;
            summaries.push(self.summarize_primary(&chunk).await?);
        }
        reader
            .await
            .map_err(|e| SummarizerError::Worker(e.to_string()))?;
        Ok(summaries.join(" "))
    }

    async fn summarize_primary(&self, chunk: &Chunk) -> Result<String, SummarizerError> {
        summarize_chunk(
            &self.primary,
            &self.prompts,
            chunk,
            self.settings.min_summary_words,
        )
        .await
    }

    // ── Book ────────────────────────────────────────────────────────

    /// Summarize an ordered list of chapters into intro, summary and
    /// conclusion.
    pub async fn summarize_chapters<S: AsRef<str> + Sync>(
        &self,
        chapters: &[S],
        book_id: &str,
    ) -> Result<BookSummary, SummarizerError> {
        info!(book_id, chapters = chapters.len(), "summarizing book");
        let reduced = self.adaptive_reduce(chapters, book_id).await?;
        let summary = self.refine(reduced, book_id).await?;
        self.synthesize(summary).await
    }

    /// Tokens a summary prompt around `text` would take.
    fn prompt_tokens(&self, text: &str) -> usize {
        self.counter.count_tokens(text) + self.summary_prompt_tokens
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.settings.rate_window_secs)
    }

    async fn adaptive_reduce<S: AsRef<str> + Sync>(
        &self,
        chapters: &[S],
        book_id: &str,
    ) -> Result<String, SummarizerError> {
        let full = chapters
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(CHAPTER_SEPARATOR);
        let total_tokens = self.prompt_tokens(&full);
        let max_prompt = self.primary.budget().max_prompt_tokens();
        if total_tokens <= max_prompt {
            return Ok(full);
        }

        let secondary = self.secondary.as_ref().ok_or(SummarizerError::MissingSecondary)?;
        let ratio = adaptive_ratio(max_prompt, total_tokens);
        let stage_model = secondary.with_ratio(ratio)?;
        info!(
            model = %stage_model.model_name(),
            total_tokens,
            max_prompt_tokens = max_prompt,
            sum_ratio = ratio,
            "book exceeds primary prompt, reducing with secondary model"
        );

        let chunker = TextChunker::new(
            self.counter.clone(),
            chunk_limit(&stage_model, self.summary_prompt_tokens)?,
        );
        let chunks: Vec<Chunk> = chunker
            .chunk_chapters(chapters, book_id)
            .collect::<Result<_, _>>()?;
        info!(
            model = %stage_model.model_name(),
            chunk_tokens = chunker.max_tokens(),
            total_chunks = chunks.len(),
            "chapters chunked for reduction"
        );

        let pool = WorkerPool::new(
            self.settings.adaptive_workers,
            self.settings.batch_size,
            self.window(),
        );
        let summaries = self.map_chunks(&pool, &stage_model, chunks).await?;
        Ok(summaries.join(SUMMARY_SEPARATOR))
    }

    async fn refine(&self, text: String, book_id: &str) -> Result<String, SummarizerError> {
        let tokens = self.prompt_tokens(&text);
        let max_prompt = self.primary.budget().max_prompt_tokens();

        if tokens > max_prompt {
            warn!(
                model = %self.primary.model_name(),
                tokens,
                max_prompt_tokens = max_prompt,
                "reduced book still does not fit, mapping with primary model"
            );
            let chunks: Vec<Chunk> = self
                .chunker
                .chunk_text(&text, book_id)
                .collect::<Result<_, _>>()?;
            let pool = WorkerPool::new(
                primary_parallelism(),
                self.settings.batch_size,
                self.window(),
            );
            let summaries = self.map_chunks(&pool, &self.primary, chunks).await?;
            return Ok(summaries.join(SUMMARY_SEPARATOR));
        }

        let words = self.settings.summary_word_count;
        if (CONDENSE_WORDS_PER_TOKEN * tokens as f64) as usize > words {
            info!(
                model = %self.primary.model_name(),
                tokens,
                target_words = words,
                "condensing book in one call"
            );
            let prompt = self.prompts.render_summary(words, &text);
            return self.call_primary(&prompt).await;
        }

        warn!(tokens, "book already short, keeping it verbatim");
        Ok(text)
    }

    async fn synthesize(&self, summary: String) -> Result<BookSummary, SummarizerError> {
        info!(
            model = %self.primary.model_name(),
            words = summary.split_whitespace().count(),
            "generating intro and conclusion"
        );
        let prompt = self.prompts.render_intro_conclusion(&summary);
        let response = self.call_primary(&prompt).await?;
        let parsed = parse_intro_conclusion(&response)?;
        Ok(BookSummary {
            intro: parsed.intro,
            summary,
            conclusion: parsed.conclusion,
        })
    }

    async fn call_primary(&self, prompt: &str) -> Result<String, SummarizerError> {
        self.primary
            .summarize(prompt)
            .await
            .map_err(|source| SummarizerError::CapabilityFailure {
                model: self.primary.model_name().to_string(),
                source,
            })
    }

    async fn map_chunks(
        &self,
        pool: &WorkerPool,
        model: &SummaryModel,
        chunks: Vec<Chunk>,
    ) -> Result<Vec<String>, SummarizerError> {
        let min_words = self.settings.min_summary_words;
        pool.map(chunks, |chunk| {
            let model = model.clone();
            let prompts = self.prompts.clone();
            async move { summarize_chunk(&model, &prompts, &chunk, min_words).await }
        })
        .await
    }
}

/// Chunk limit for `model`: its prompt allowance minus the summary template.
fn chunk_limit(model: &SummaryModel, prompt_tokens: usize) -> Result<usize, SummarizerError> {
    match model.budget().max_prompt_tokens().checked_sub(prompt_tokens) {
        Some(limit) if limit > 0 => Ok(limit),
        _ => Err(BudgetError::ZeroCeiling.into()),
    }
}
