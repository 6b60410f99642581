//! Bounded conversation history.
//!
//! Recent exchanges are replayed to the model so it does not keep proposing
//! the same edit, or undoing one the user just accepted.

use std::collections::VecDeque;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// The last `max_pairs` user/assistant exchanges, oldest first.
#[derive(Debug)]
pub struct MessageHistory {
    entries: VecDeque<HistoryEntry>,
    max_pairs: usize,
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_PAIRS)
    }
}

impl MessageHistory {
    pub fn new(max_pairs: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_pairs * 2),
            max_pairs,
        }
    }

    /// Record one exchange, evicting the oldest when full.
    pub fn push_pair(&mut self, user: String, assistant: String) {
        if self.max_pairs == 0 {
            return;
        }
        while self.entries.len() >= self.max_pairs * 2 {
            self.entries.pop_front();
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            role: Role::User,
            content: user,
        });
        self.entries.push_back(HistoryEntry {
            role: Role::Assistant,
            content: assistant,
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Number of stored exchanges.
    pub fn pairs(&self) -> usize {
        self.entries.len() / 2
    }

    pub fn max_pairs(&self) -> usize {
        self.max_pairs
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
