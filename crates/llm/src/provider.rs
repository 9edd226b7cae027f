use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chat message for the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
        }
    }
}

/// Trait for LLM providers; each backend implements this.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and return the assistant's response text.
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Markers providers put in a 400 body when the prompt overflows the model.
const CONTEXT_LENGTH_MARKERS: &[&str] = &[
    "context_length_exceeded",
    "maximum context length",
    "context length",
    "too many tokens",
];

/// Failure kinds of the summarization capability.
///
/// The orchestrator aborts on any of them; the kind is kept so callers at
/// the edge can report what went wrong.
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("rate limited: {0}")]
    RateLimited(#[source] LlmError),
    #[error("context too long: {0}")]
    ContextTooLong(#[source] LlmError),
    #[error("transient failure: {0}")]
    Transient(#[source] LlmError),
}

impl SummarizeError {
    pub fn kind(&self) -> &'static str {
        match self {
            SummarizeError::RateLimited(_) => "RateLimited",
            SummarizeError::ContextTooLong(_) => "ContextTooLong",
            SummarizeError::Transient(_) => "Transient",
        }
    }
}

impl From<LlmError> for SummarizeError {
    fn from(err: LlmError) -> Self {
        match &err {
            LlmError::ApiError { status: 429, .. } => SummarizeError::RateLimited(err),
            LlmError::ApiError { status: 400, body } => {
                let body = body.to_lowercase();
                if CONTEXT_LENGTH_MARKERS.iter().any(|m| body.contains(m)) {
                    SummarizeError::ContextTooLong(err)
                } else {
                    SummarizeError::Transient(err)
                }
            }
            _ => SummarizeError::Transient(err),
        }
    }
}
