pub mod ollama;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use booksum_core::config::LlmConfig;

use crate::provider::{LlmError, LlmProvider};

/// Create the appropriate LLM provider for `model` based on config.
pub fn create_provider(
    llm_config: &LlmConfig,
    model: &str,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let timeout = Duration::from_secs(llm_config.request_timeout_secs);
    match llm_config.provider.as_str() {
        "openai" => {
            let api_key = llm_config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            let base_url = llm_config
                .openai_base_url
                .as_deref()
                .unwrap_or(openai::DEFAULT_BASE_URL);
            Ok(Arc::new(openai::OpenAiProvider::new(
                api_key.clone(),
                model.to_string(),
                base_url.to_string(),
                timeout,
            )?))
        }
        "ollama" => Ok(Arc::new(ollama::OllamaProvider::new(
            llm_config.ollama_url.clone(),
            model.to_string(),
            timeout,
        )?)),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(provider: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            openai_api_key: api_key.map(str::to_string),
            openai_base_url: None,
            ollama_url: "http://localhost:11434".to_string(),
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn openai_requires_an_api_key() {
        let err = create_provider(&llm_config("openai", None), "gpt-4").err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(_)));
        assert!(create_provider(&llm_config("openai", Some("sk-x")), "gpt-4").is_ok());
    }

    #[test]
    fn ollama_needs_no_key() {
        assert!(create_provider(&llm_config("ollama", None), "llama3").is_ok());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = create_provider(&llm_config("carrier-pigeon", None), "m").err().unwrap();
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
