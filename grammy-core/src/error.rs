//! Engine error types.

use grammy_api::SuggestionId;
use thiserror::Error;

/// Why an accept was refused. No text is mutated in either case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcceptError {
    /// Unknown id: already accepted, or the set was replaced. A UI desync, not a race.
    #[error("suggestion {0} is no longer available")]
    NotFound(SuggestionId),

    /// The live text no longer holds the suggestion's original slice.
    #[error("suggestion {0} no longer matches the text")]
    StaleSuggestion(SuggestionId),
}

/// Failure of a single check request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckerError {
    /// The request was cancelled by a newer edit. Never surfaced.
    #[error("check cancelled")]
    Cancelled,

    #[error("API key not set")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Checker error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The provider accepted the key but does not offer the configured model.
    #[error("Model '{model}' not found for {provider}")]
    ModelNotFound { model: String, provider: String },
}

impl CheckerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CheckerError::Cancelled)
    }
}

/// Rejections from the apply authority.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("Invalid suggestion range")]
    InvalidRange,

    #[error("Text changed since the last check; please run Check again")]
    TextChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// The engine actor has stopped and no longer accepts messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine is no longer running")]
pub struct EngineClosed;
