//! Grammy Core - The suggestion synchronization engine.
//!
//! This crate keeps checker suggestions in step with a live, editable text:
//! - Offset normalization (checker indices to storage offsets)
//! - Overlap resolution
//! - Suggestion registry (accept, rebase, stale detection)
//! - Check scheduling (debounce, cancellation, stale-result discard)
//! - Render synchronization (annotated runs, caret preservation)
//! - Stateless apply authority for remote hosts

pub mod apply;
pub mod checker;
pub mod config;
pub mod engine;
pub mod normalize;
pub mod overlap;
pub mod registry;
pub mod render;
pub mod scheduler;

mod error;

pub use apply::apply_suggestion;
pub use checker::Checker;
pub use config::{EngineConfig, DEFAULT_DEBOUNCE};
pub use engine::{Engine, EngineHandle, Message};
pub use error::{AcceptError, ApplyError, CheckerError, ConfigError, EngineClosed};
pub use normalize::{normalize, normalize_in, MatchRejection, OffsetTable, StorageUnit};
pub use overlap::{resolve, ResolvedSet};
pub use registry::{Accepted, SuggestionRegistry};
pub use render::{AnnotatedText, BufferSurface, CaretPosition, RenderSync, Run, Surface};
pub use scheduler::{CheckScheduler, Completion, Effect, Epoch, SchedulerState, Verdict};
