//! Prompt templates, loaded once at startup and shared read-only.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Target summary length in words.
pub const WORD_COUNT: &str = "{{WORD_COUNT}}";
/// Text to summarize.
pub const CHUNK_TEXT: &str = "{{CHUNK_TEXT}}";
/// Final summary handed to the intro/conclusion prompt.
pub const SUMMARY_TEXT: &str = "{{SUMMARY_TEXT}}";

const BUILTIN_PROMPTS: &str = include_str!("../resources/prompts.json");

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid prompt JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{template} template is missing the {placeholder} placeholder")]
    MissingPlaceholder {
        template: &'static str,
        placeholder: &'static str,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplates {
    #[serde(rename = "summary-prompt")]
    summary: String,
    #[serde(rename = "intro-conclusion-prompt")]
    intro_conclusion: String,
}

impl PromptTemplates {
    pub fn new(
        summary: impl Into<String>,
        intro_conclusion: impl Into<String>,
    ) -> Result<Self, PromptError> {
        let templates = Self {
            summary: summary.into(),
            intro_conclusion: intro_conclusion.into(),
        };
        templates.validate()?;
        Ok(templates)
    }

    /// Templates shipped with the crate.
    pub fn builtin() -> Result<Self, PromptError> {
        Self::from_json(BUILTIN_PROMPTS)
    }

    pub fn from_json(json: &str) -> Result<Self, PromptError> {
        let templates: Self = serde_json::from_str(json)?;
        templates.validate()?;
        Ok(templates)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PromptError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PromptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let templates = Self::from_json(&json)?;
        info!(path = %path.display(), "prompt templates loaded");
        Ok(templates)
    }

    /// Load from `path` when given, otherwise fall back to the built-in set.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, PromptError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    fn validate(&self) -> Result<(), PromptError> {
        let required = [
            ("summary", &self.summary, WORD_COUNT),
            ("summary", &self.summary, CHUNK_TEXT),
            ("intro-conclusion", &self.intro_conclusion, SUMMARY_TEXT),
        ];
        for (template, text, placeholder) in required {
            if !text.contains(placeholder) {
                return Err(PromptError::MissingPlaceholder {
                    template,
                    placeholder,
                });
            }
        }
        Ok(())
    }

    /// The raw summary template, used to size chunk limits.
    pub fn summary_template(&self) -> &str {
        &self.summary
    }

    pub fn render_summary(&self, word_count: usize, text: &str) -> String {
        // word count first: the text may itself contain placeholder-like strings
        self.summary
            .replace(WORD_COUNT, &word_count.to_string())
            .replace(CHUNK_TEXT, text)
    }

    pub fn render_intro_conclusion(&self, summary: &str) -> String {
        self.intro_conclusion.replace(SUMMARY_TEXT, summary)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_templates_are_valid() {
        let prompts = PromptTemplates::builtin().unwrap();
        let rendered = prompts.render_summary(120, "Call me Ishmael.");
        assert!(rendered.contains("120 words"));
        assert!(rendered.contains("Call me Ishmael."));
        assert!(!rendered.contains("{{"));
        assert!(prompts.render_intro_conclusion("S").ends_with('S'));
    }

    #[test]
    fn chunk_text_is_inserted_verbatim() {
        let prompts = PromptTemplates::new("{{WORD_COUNT}}|{{CHUNK_TEXT}}", "{{SUMMARY_TEXT}}").unwrap();
        assert_eq!(prompts.render_summary(7, "a {{WORD_COUNT}} b"), "7|a {{WORD_COUNT}} b");
    }

    #[test]
    fn missing_placeholder_is_rejected() {
        let err = PromptTemplates::new("Summarize {{CHUNK_TEXT}}", "{{SUMMARY_TEXT}}").unwrap_err();
        assert!(matches!(
            err,
            PromptError::MissingPlaceholder { template: "summary", placeholder: WORD_COUNT }
        ));

        let err = PromptTemplates::new("{{WORD_COUNT}} {{CHUNK_TEXT}}", "no slot").unwrap_err();
        assert!(matches!(err, PromptError::MissingPlaceholder { template: "intro-conclusion", .. }));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"summary-prompt": "In {{{{WORD_COUNT}}}} words: {{{{CHUNK_TEXT}}}}", "intro-conclusion-prompt": "Wrap {{{{SUMMARY_TEXT}}}}"}}"#
        )
        .unwrap();

        let prompts = PromptTemplates::load(file.path()).unwrap();
        assert_eq!(prompts.render_summary(3, "x"), "In 3 words: x");
        assert_eq!(prompts.render_intro_conclusion("y"), "Wrap y");
    }

    #[test]
    fn missing_file_and_bad_json() {
        assert!(matches!(
            PromptTemplates::load("/no/such/prompts.json"),
            Err(PromptError::Io { .. })
        ));
        assert!(matches!(PromptTemplates::from_json("{"), Err(PromptError::Parse(_))));
        assert!(matches!(
            PromptTemplates::load_or_builtin(None),
            Ok(_)
        ));
    }
}
