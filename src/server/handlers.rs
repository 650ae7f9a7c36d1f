use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::format::format_plain;
use crate::query::QueryError;

use super::AppState;

const UNAVAILABLE: &str = "Net worth not yet available";
const INSUFFICIENT: &str = "Insufficient data";
const HISTORY_FAILED: &str = "Failed to read history";
const CHANGE_FAILED: &str = "Failed to compute change";

pub(super) async fn net_worth(State(state): State<AppState>) -> Response {
    match state.query.current_net_worth() {
        Ok(value) => format_plain(value).into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE).into_response(),
    }
}

pub(super) async fn change(State(state): State<AppState>) -> Response {
    match state.query.change_30_days().await {
        Ok(value) => format_plain(value).into_response(),
        Err(QueryError::Unavailable | QueryError::InsufficientData) => {
            (StatusCode::SERVICE_UNAVAILABLE, INSUFFICIENT).into_response()
        }
        Err(QueryError::History(err)) => {
            error!(error = %err, "failed to read net worth history");
            (StatusCode::INTERNAL_SERVER_ERROR, HISTORY_FAILED).into_response()
        }
        Err(err @ QueryError::Overflow) => {
            error!(error = %err, "failed to compute 30-day change");
            (StatusCode::INTERNAL_SERVER_ERROR, CHANGE_FAILED).into_response()
        }
    }
}

pub(super) async fn details(State(state): State<AppState>) -> Response {
    match state.query.details().await {
        Ok(details) => Json(details).into_response(),
        Err(QueryError::Unavailable) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": UNAVAILABLE })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to build net worth details");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

pub(super) async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(super) async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}
