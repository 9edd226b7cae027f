use booksum_summarizer::BookSummarizer;

/// Shared, read-only application state. The summarizer is built once at
/// startup and handed to every request.
pub struct AppState {
    pub summarizer: BookSummarizer,
}
