//! HTTP boundary: plain-text and JSON views over [`QueryService`].

mod handlers;

use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::query::QueryService;
use crate::shutdown::Shutdown;

#[derive(Clone)]
pub struct AppState {
    pub query: Arc<QueryService>,
}

impl AppState {
    pub fn new(query: Arc<QueryService>) -> Self {
        Self { query }
    }
}

/// Every request gets permissive CORS headers; preflights are answered
/// with an empty 204 before routing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::net_worth))
        .route("/networth", get(handlers::net_worth))
        .route("/change", get(handlers::change))
        .route("/networth/change", get(handlers::change))
        .route("/networth/details", get(handlers::details))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(middleware::from_fn(preflight))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
}

async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(request).await
}

/// Serve until `shutdown` fires, then let open connections drain.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: Shutdown,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
