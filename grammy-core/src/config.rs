//! Engine configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Debounce applied when nothing else is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(600);

const DEBOUNCE_ENV: &str = "GRAMMY_DEBOUNCE_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Quiet period after the last edit before a check is issued.
    pub debounce: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl EngineConfig {
    pub fn with_debounce(debounce: Duration) -> Self {
        Self { debounce }
    }

    /// Read overrides from the environment (`GRAMMY_DEBOUNCE_MS`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(DEBOUNCE_ENV) {
            let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: DEBOUNCE_ENV,
                value: raw.clone(),
            })?;
            config.debounce = Duration::from_millis(ms);
        }
        Ok(config)
    }
}
