use booksum_core::config::{LlmConfig, ModelConfig};
use booksum_core::{Config, TokenBudget};
use booksum_llm::{create_provider, SummaryModel};
use tracing::info;

use crate::error::SummarizerError;
use crate::orchestrator::BookSummarizer;
use crate::prompts::PromptTemplates;

/// Build one summary model from its config section.
pub fn build_model(llm: &LlmConfig, model: &ModelConfig) -> Result<SummaryModel, SummarizerError> {
    let provider = create_provider(llm, &model.model)?;
    let budget = TokenBudget::new(&model.model, model.max_tokens, model.sum_ratio)?;
    Ok(SummaryModel::new(provider, budget, model.temperature))
}

/// Build the summarizer once at startup; callers share it by reference.
pub fn build_summarizer(config: &Config) -> Result<BookSummarizer, SummarizerError> {
    let primary = build_model(&config.llm, &config.primary)?;
    let secondary = if config.secondary.enabled {
        Some(build_model(&config.llm, &config.secondary)?)
    } else {
        info!("secondary model disabled, long books will be rejected");
        None
    };
    let prompts = PromptTemplates::load_or_builtin(config.orchestrator.prompts_path.as_deref())?;
    let counter = config.tokenizer.build()?;

    BookSummarizer::new(
        primary,
        secondary,
        prompts,
        counter,
        config.orchestrator.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config = Config::for_profile("");
        config.llm.provider = "ollama".into();
        config.tokenizer = booksum_core::TokenizerKind::Whitespace;
        config.orchestrator.prompts_path = None;
        config
    }

    #[test]
    fn builds_from_config() {
        let summarizer = build_summarizer(&config()).unwrap();
        assert_eq!(summarizer.primary().model_name(), config().primary.model);
        assert_eq!(
            summarizer.primary().budget().max_tokens(),
            config().primary.max_tokens
        );
        assert!(summarizer.secondary().is_some());
    }

    #[test]
    fn secondary_can_be_disabled() {
        let mut config = config();
        config.secondary.enabled = false;
        let summarizer = build_summarizer(&config).unwrap();
        assert!(summarizer.secondary().is_none());
    }

    #[test]
    fn invalid_ratio_is_reported() {
        let mut config = config();
        config.primary.sum_ratio = 1.5;
        assert!(matches!(
            build_summarizer(&config),
            Err(SummarizerError::Budget(_))
        ));
    }
}
