//! Grammy API - Shared types for the suggestion engine, its checkers, and the HTTP service.

mod event;
mod protocol;
mod suggestion;

pub use event::*;
pub use protocol::*;
pub use suggestion::*;
