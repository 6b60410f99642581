//! Grammy LLM - Chat-completion grammar checker.
//!
//! Implements the engine's `Checker` for OpenAI-compatible endpoints
//! (OpenAI, OpenRouter), with environment configuration and a bounded
//! conversation history.

pub mod client;
pub mod config;
pub mod history;

pub use client::LlmChecker;
pub use config::{LlmConfig, Provider, DEFAULT_HISTORY_PAIRS, DEFAULT_TIMEOUT};
pub use history::{HistoryEntry, MessageHistory, Role};
