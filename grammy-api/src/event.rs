//! Engine events emitted to subscribers (UI, status bar, logs).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Suggestion, SuggestionId};

/// The single human-readable status line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Ready,
    Checking,
    /// Suggestions are displayed. Zero renders as "All good!".
    Suggestions(usize),
    /// An accept was rejected because the text drifted; a new check is queued.
    Rechecking,
    /// A surfaced error, shown verbatim.
    Error(String),
}

impl Status {
    pub fn from_count(count: usize) -> Self {
        Status::Suggestions(count)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ready => write!(f, "Ready"),
            Status::Checking => write!(f, "Checking..."),
            Status::Suggestions(0) => write!(f, "All good!"),
            Status::Suggestions(n) => write!(f, "{} suggestion(s)", n),
            Status::Rechecking => write!(f, "Text changed; re-checking..."),
            Status::Error(message) => write!(f, "{}", message),
        }
    }
}

/// Events emitted by the suggestion engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    /// The status line changed.
    StatusChanged(Status),

    /// The active suggestion set was replaced, rebased, or cleared.
    SuggestionsChanged { suggestions: Vec<Suggestion> },

    /// The hovered suggestion changed. `None` means nothing is hovered.
    HoverChanged(Option<SuggestionId>),

    /// The engine rewrote the live text (an accepted suggestion).
    TextReplaced { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lines() {
        assert_eq!(Status::Ready.to_string(), "Ready");
        assert_eq!(Status::Checking.to_string(), "Checking...");
        assert_eq!(Status::from_count(0).to_string(), "All good!");
        assert_eq!(Status::from_count(1).to_string(), "1 suggestion(s)");
        assert_eq!(Status::from_count(3).to_string(), "3 suggestion(s)");
        assert_eq!(
            Status::Error("Network error: timeout".into()).to_string(),
            "Network error: timeout"
        );
    }
}
