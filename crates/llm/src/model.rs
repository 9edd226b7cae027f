//! The summarization capability: a provider bound to one model's token budget.

use std::sync::Arc;

use booksum_core::{BudgetError, TokenBudget};
use tracing::debug;

use crate::provider::{LlmProvider, Message, Role, SummarizeError};

/// Turns a prompt into generated text under a fixed token ceiling.
///
/// Cheap to clone; clones share the provider but own their budget, so a
/// stage can adjust its ratio on a copy without affecting anyone else.
#[derive(Clone)]
pub struct SummaryModel {
    provider: Arc<dyn LlmProvider>,
    budget: TokenBudget,
    temperature: f32,
}

impl SummaryModel {
    pub fn new(provider: Arc<dyn LlmProvider>, budget: TokenBudget, temperature: f32) -> Self {
        Self {
            provider,
            budget,
            temperature,
        }
    }

    pub fn model_name(&self) -> &str {
        self.budget.model_name()
    }

    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    pub fn sum_ratio(&self) -> f64 {
        self.budget.sum_ratio()
    }

    /// A copy of this model whose budget uses `sum_ratio`.
    pub fn with_ratio(&self, sum_ratio: f64) -> Result<Self, BudgetError> {
        let mut model = self.clone();
        model.budget.set_ratio(sum_ratio)?;
        Ok(model)
    }

    /// Send `prompt` as a single system message. The completion is capped at
    /// the budget's completion allowance.
    pub async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        let messages = vec![Message {
            role: Role::System,
            content: prompt.to_string(),
        }];
        let max_tokens = u32::try_from(self.budget.max_completion_tokens()).unwrap_or(u32::MAX);

        debug!(model = %self.model_name(), prompt_len = prompt.len(), max_tokens, "summarize request");

        let text = self
            .provider
            .complete(messages, self.temperature, max_tokens)
            .await?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::provider::LlmError;

    /// Records every request and echoes a fixed reply.
    struct RecordingProvider {
        reply: Result<String, u16>,
        seen: Mutex<Vec<(Vec<Message>, f32, u32)>>,
    }

    impl RecordingProvider {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        async fn complete(
            &self,
            messages: Vec<Message>,
            temperature: f32,
            max_tokens: u32,
        ) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push((messages, temperature, max_tokens));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::ApiError {
                    status: *status,
                    body: "nope".into(),
                }),
            }
        }
    }

    fn budget() -> TokenBudget {
        TokenBudget::new("gpt-4", 8000, 0.45).unwrap()
    }

    #[tokio::test]
    async fn sends_one_system_message_capped_at_completion_budget() {
        let provider = Arc::new(RecordingProvider::replying("  a short summary \n"));
        let model = SummaryModel::new(provider.clone(), budget(), 0.7);

        let text = model.summarize("Summarize: hello").await.unwrap();
        assert_eq!(text, "a short summary");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (messages, temperature, max_tokens) = &seen[0];
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0].role, Role::System));
        assert_eq!(messages[0].content, "Summarize: hello");
        assert!((temperature - 0.7).abs() < 1e-6);
        assert_eq!(*max_tokens, 2483);
    }

    #[tokio::test]
    async fn provider_errors_are_classified() {
        let model = SummaryModel::new(Arc::new(RecordingProvider::failing(429)), budget(), 0.7);
        let err = model.summarize("x").await.unwrap_err();
        assert!(matches!(err, SummarizeError::RateLimited(_)));
    }

    #[test]
    fn with_ratio_leaves_the_original_untouched() {
        let model = SummaryModel::new(Arc::new(RecordingProvider::replying("")), budget(), 0.7);
        let adjusted = model.with_ratio(0.35).unwrap();

        assert_eq!(model.sum_ratio(), 0.45);
        assert_eq!(adjusted.sum_ratio(), 0.35);
        assert_eq!(adjusted.budget().max_prompt_tokens(), 5925);
        assert_eq!(adjusted.model_name(), "gpt-4");
        assert!(model.with_ratio(0.0).is_err());
    }
}
