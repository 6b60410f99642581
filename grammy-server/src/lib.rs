//! Grammy Server - HTTP front end for the checker and the apply authority.
//!
//! Routes:
//! - `POST /api/check`: run the checker, return normalized suggestions
//! - `POST /api/apply`: splice one suggestion into caller-held text

pub mod routes;

use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use grammy_core::{Checker, CheckerError};
use grammy_llm::{LlmChecker, LlmConfig};
use tower_http::trace::TraceLayer;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub checker: Arc<dyn Checker>,
}

impl AppState {
    pub fn new(checker: Arc<dyn Checker>) -> Self {
        Self { checker }
    }
}

/// Build the checker the server shares between all clients. History is
/// off: one client's text must never be replayed in another's request.
pub fn llm_checker(config: LlmConfig) -> Result<LlmChecker, CheckerError> {
    LlmChecker::new(config.with_history_pairs(0))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/check", post(routes::check))
        .route("/api/apply", post(routes::apply))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
