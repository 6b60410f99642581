//! Provider and client configuration, read from the environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use grammy_core::ConfigError;

const API_KEY_ENV: &str = "GRAMMY_LLM_API_KEY";
const PROVIDER_ENV: &str = "GRAMMY_LLM_PROVIDER";
const API_BASE_ENV: &str = "GRAMMY_LLM_API_BASE";
const MODEL_ENV: &str = "GRAMMY_LLM_MODEL";
const TIMEOUT_ENV: &str = "GRAMMY_LLM_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_HISTORY_PAIRS: usize = 5;

/// OpenAI-compatible chat-completion providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    OpenAi,
    OpenRouter,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::OpenRouter => "OpenRouter",
        }
    }

    /// API root; the client appends `/chat/completions`.
    pub fn api_base(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::OpenRouter => "openai/gpt-4o-mini",
        }
    }

    /// Provider-specific key variable consulted after `GRAMMY_LLM_API_KEY`.
    pub fn key_env(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "openrouter" => Ok(Provider::OpenRouter),
            _ => Err(ConfigError::InvalidValue {
                key: PROVIDER_ENV,
                value: s.to_string(),
            }),
        }
    }
}

/// Everything the HTTP checker needs to reach a provider.
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: Provider,
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    /// User/assistant exchanges replayed as context. Zero disables history.
    pub history_pairs: usize,
}

impl LlmConfig {
    /// Defaults for `provider` with the given key.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_base: provider.api_base().to_string(),
            api_key: api_key.into(),
            model: provider.default_model().to_string(),
            timeout: DEFAULT_TIMEOUT,
            history_pairs: DEFAULT_HISTORY_PAIRS,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_history_pairs(mut self, pairs: usize) -> Self {
        self.history_pairs = pairs;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match value(PROVIDER_ENV) {
            Some(raw) => raw.parse()?,
            None => Provider::default(),
        };

        let api_key = value(API_KEY_ENV)
            .or_else(|| value(provider.key_env()))
            .ok_or(ConfigError::Missing(API_KEY_ENV))?;

        let mut config = Self::new(provider, api_key.trim());
        if let Some(base) = value(API_BASE_ENV) {
            config.api_base = base;
        }
        if let Some(model) = value(MODEL_ENV) {
            config.model = model;
        }
        if let Some(raw) = value(TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: TIMEOUT_ENV,
                value: raw.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("history_pairs", &self.history_pairs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_openai_defaults() {
        let config = LlmConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.api_base, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.history_pairs, 5);
    }

    #[test]
    fn test_grammy_key_takes_precedence() {
        let config = LlmConfig::from_lookup(lookup(&[
            ("GRAMMY_LLM_API_KEY", "grammy"),
            ("OPENAI_API_KEY", "openai"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "grammy");
    }

    #[test]
    fn test_blank_key_falls_through() {
        let config = LlmConfig::from_lookup(lookup(&[
            ("GRAMMY_LLM_API_KEY", "  "),
            ("OPENAI_API_KEY", "openai"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "openai");
    }

    #[test]
    fn test_openrouter_provider() {
        let config = LlmConfig::from_lookup(lookup(&[
            ("GRAMMY_LLM_PROVIDER", "OpenRouter"),
            ("OPENROUTER_API_KEY", "or-key"),
            ("OPENAI_API_KEY", "ignored"),
        ]))
        .unwrap();
        assert_eq!(config.provider, Provider::OpenRouter);
        assert_eq!(config.api_key, "or-key");
        assert_eq!(config.api_base, "https://openrouter.ai/api/v1");
        assert_eq!(config.model, "openai/gpt-4o-mini");
    }

    #[test]
    fn test_overrides() {
        let config = LlmConfig::from_lookup(lookup(&[
            ("GRAMMY_LLM_API_KEY", "k"),
            ("GRAMMY_LLM_API_BASE", "http://localhost:8080/v1"),
            ("GRAMMY_LLM_MODEL", "local-model"),
            ("GRAMMY_LLM_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "http://localhost:8080/v1");
        assert_eq!(config.model, "local-model");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_key() {
        let err = LlmConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("GRAMMY_LLM_API_KEY"));
    }

    #[test]
    fn test_invalid_values() {
        let err = LlmConfig::from_lookup(lookup(&[
            ("GRAMMY_LLM_PROVIDER", "anthropic"),
            ("GRAMMY_LLM_API_KEY", "k"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "GRAMMY_LLM_PROVIDER", .. }));

        let err = LlmConfig::from_lookup(lookup(&[
            ("GRAMMY_LLM_API_KEY", "k"),
            ("GRAMMY_LLM_TIMEOUT_SECS", "a minute"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "GRAMMY_LLM_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = LlmConfig::new(Provider::OpenAi, "sk-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
