use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tokenizer::TokenizerKind;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub primary: ModelConfig,
    pub secondary: ModelConfig,
    pub tokenizer: TokenizerKind,
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `BOOKSUM_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("BOOKSUM_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            primary: ModelConfig::from_env_profiled(p, "PRIMARY", ModelConfig::primary_default()),
            secondary: ModelConfig::from_env_profiled(
                p,
                "SECONDARY",
                ModelConfig::secondary_default(),
            ),
            tokenizer: profiled_env_opt(p, "TOKENIZER")
                .and_then(|v| v.parse().ok())
                .unwrap_or(TokenizerKind::Cl100k),
            orchestrator: OrchestratorConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:       {}:{}", self.server.host, self.server.port);
        tracing::info!("  llm:          provider={}, configured={}", self.llm.provider, self.llm.is_configured());
        tracing::info!(
            "  primary:      model={}, max_tokens={}, sum_ratio={}",
            self.primary.model, self.primary.max_tokens, self.primary.sum_ratio
        );
        if self.secondary.enabled {
            tracing::info!(
                "  secondary:    model={}, max_tokens={}, sum_ratio={}",
                self.secondary.model, self.secondary.max_tokens, self.secondary.sum_ratio
            );
        } else {
            tracing::info!("  secondary:    disabled");
        }
        tracing::info!("  tokenizer:    {}", self.tokenizer);
        tracing::info!(
            "  orchestrator: batch_size={}, rate_window={}s, summary_words={}",
            self.orchestrator.batch_size,
            self.orchestrator.rate_window_secs,
            self.orchestrator.summary_word_count
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "llm": {
                "provider": self.llm.provider,
                "configured": self.llm.is_configured(),
                "request_timeout_secs": self.llm.request_timeout_secs,
            },
            "primary": self.primary,
            "secondary": self.secondary,
            "tokenizer": self.tokenizer,
            "orchestrator": self.orchestrator,
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 8080),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── LLM transport (OpenAI / Ollama) ───────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "ollama"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub ollama_url: String,
    pub request_timeout_secs: u64,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "openai"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            ollama_url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            request_timeout_secs: profiled_env_parse(p, "LLM_REQUEST_TIMEOUT_SECS", 120),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }
}

// ── Summarization models ──────────────────────────────────────

/// One summarization model: its name, absolute token ceiling and the
/// initial summary ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub enabled: bool,
    pub model: String,
    pub max_tokens: usize,
    pub sum_ratio: f64,
    pub temperature: f32,
}

impl ModelConfig {
    pub fn primary_default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4".to_string(),
            max_tokens: 8000,
            sum_ratio: 0.45,
            temperature: 0.7,
        }
    }

    pub fn secondary_default() -> Self {
        Self {
            enabled: true,
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 4000,
            sum_ratio: 0.5,
            temperature: 0.7,
        }
    }

    /// Reads `{PREFIX}_MODEL`, `{PREFIX}_MAX_TOKENS`, `{PREFIX}_SUM_RATIO`,
    /// `{PREFIX}_TEMPERATURE` and `{PREFIX}_ENABLED`.
    fn from_env_profiled(p: &str, prefix: &str, defaults: Self) -> Self {
        let key = |k: &str| format!("{prefix}_{k}");
        Self {
            enabled: profiled_env_parse(p, &key("ENABLED"), defaults.enabled),
            model: profiled_env_or(p, &key("MODEL"), &defaults.model),
            max_tokens: profiled_env_parse(p, &key("MAX_TOKENS"), defaults.max_tokens),
            sum_ratio: profiled_env_parse(p, &key("SUM_RATIO"), defaults.sum_ratio),
            temperature: profiled_env_parse(p, &key("TEMPERATURE"), defaults.temperature),
        }
    }
}

// ── Orchestrator ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Chunks dispatched per rate-limit window.
    pub batch_size: usize,
    /// Length of the external requests-per-window quota.
    pub rate_window_secs: u64,
    /// Words expected in the final book summary.
    pub summary_word_count: usize,
    /// Minimum number of words requested for any chunk summary.
    pub min_summary_words: usize,
    /// Worker ceiling for the adaptive (secondary) stage.
    pub adaptive_workers: usize,
    /// Optional prompt template file overriding the built-in templates.
    pub prompts_path: Option<PathBuf>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: 22,
            rate_window_secs: 60,
            summary_word_count: 1800,
            min_summary_words: 15,
            adaptive_workers: 4,
            prompts_path: None,
        }
    }
}

impl OrchestratorConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            batch_size: profiled_env_parse(p, "BATCH_SIZE", d.batch_size),
            rate_window_secs: profiled_env_parse(p, "RATE_WINDOW_SECS", d.rate_window_secs),
            summary_word_count: profiled_env_parse(p, "SUMMARY_WORD_COUNT", d.summary_word_count),
            min_summary_words: profiled_env_parse(p, "MIN_SUMMARY_WORDS", d.min_summary_words),
            adaptive_workers: profiled_env_parse(p, "ADAPTIVE_WORKERS", d.adaptive_workers),
            prompts_path: profiled_env_opt(p, "PROMPTS_PATH").map(PathBuf::from),
        }
    }
}
