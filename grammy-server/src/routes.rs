//! Route handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use grammy_api::{ApplyRequest, CheckRequest, CheckResponse, ErrorResponse};
use grammy_core::{apply_suggestion, normalize, resolve, ApplyError};

use crate::AppState;

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// `POST /api/check`
///
/// Blank text is answered without calling the checker. Checker failures map
/// to 502 with the reason in `error`.
pub async fn check(State(state): State<AppState>, Json(request): Json<CheckRequest>) -> Response {
    if request.text.trim().is_empty() {
        return Json(CheckResponse { matches: Vec::new() }).into_response();
    }

    match state.checker.check(&request.text).await {
        Ok(raw) => {
            let matches = resolve(normalize(&request.text, raw)).into_vec();
            tracing::debug!("Check returned {} suggestion(s)", matches.len());
            Json(CheckResponse { matches }).into_response()
        }
        Err(e) => {
            tracing::warn!("Check via {} failed: {}", state.checker.name(), e);
            error(StatusCode::BAD_GATEWAY, format!("Check failed: {}", e))
        }
    }
}

/// `POST /api/apply`
pub async fn apply(Json(request): Json<ApplyRequest>) -> Response {
    match apply_suggestion(&request) {
        Ok(response) => Json(response).into_response(),
        Err(e @ ApplyError::InvalidRange) => error(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e @ ApplyError::TextChanged) => error(StatusCode::CONFLICT, e.to_string()),
    }
}
