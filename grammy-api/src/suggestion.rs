//! Suggestion representation - a replaceable span of the live text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use uuid::Uuid;

/// Rule name given to matches whose checker did not report one.
pub const DEFAULT_RULE: &str = "llm";

/// Unique identifier for a suggestion. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionId(pub Uuid);

impl SuggestionId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SuggestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A correction addressed in storage units over a specific text snapshot.
///
/// `original` is the slice `[offset, offset + length)` the suggestion was
/// computed against. When that slice no longer matches the live text the
/// suggestion is stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub message: String,
    pub offset: usize,
    pub length: usize,
    pub original: String,
    pub replacement: String,
    pub rule: String,
}

impl Suggestion {
    /// Exclusive end of the addressed range.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Change in text length produced by applying this suggestion.
    pub fn delta(&self) -> isize {
        self.replacement.len() as isize - self.length as isize
    }

    /// Whether `text` still holds `original` at this suggestion's range.
    pub fn matches(&self, text: &str) -> bool {
        text.get(self.range()) == Some(self.original.as_str())
    }
}

/// A match candidate exactly as a checker reports it.
///
/// `start` and `end` are code-point indices (half-open). Nothing about them
/// is trusted until normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMatch {
    pub message: String,
    pub start: usize,
    pub end: usize,
    pub replacement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl RawMatch {
    pub fn new(
        message: impl Into<String>,
        start: usize,
        end: usize,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            start,
            end,
            replacement: replacement.into(),
            rule: None,
        }
    }
}
