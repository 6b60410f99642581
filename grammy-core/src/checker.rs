//! Checker capability - whatever turns text into raw matches.

use async_trait::async_trait;
use grammy_api::RawMatch;

use crate::error::CheckerError;

/// Trait that every checker (local rules, remote model) implements.
///
/// Implementations report `start`/`end` as code-point indices into `text`.
/// They need not validate, sort, or de-overlap; the engine does that.
/// Cancellation is handled by the caller dropping the future.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn check(&self, text: &str) -> Result<Vec<RawMatch>, CheckerError>;
}
