//! Wire protocol - JSON bodies exchanged with checkers and the apply authority.

use serde::{Deserialize, Serialize};

use crate::{RawMatch, Suggestion};

/// Request sent to a checker, and body of `POST /api/check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub text: String,
}

/// What a checker returns: unvalidated code-point matches.
///
/// An empty `matches` list means no suggestions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerOutput {
    pub matches: Vec<RawMatch>,
}

/// Response of `POST /api/check`: normalized, resolved suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub matches: Vec<Suggestion>,
}

/// Request to apply one suggestion to a text held by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub text: String,
    pub suggestion: Suggestion,
}

/// The spliced text plus any suggestions the authority chose to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResponse {
    pub text: String,
    pub matches: Vec<Suggestion>,
}

/// Error payload for any failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
