//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
  routing::{get, post},
  Router,
};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - JSON API under `/api/...`
/// - CORS (allow any origin/method/headers); tighten for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/api/health", get(http::http_health))
    .route("/api/generate-recommendations", post(http::http_generate_recommendations))
    .route("/api/generate-recommendations/all", post(http::http_generate_all))
    .route("/api/reload-content", post(http::http_reload_content))
    .route("/api/recommendations/preview", post(http::http_preview))
    .route("/api/score-pronunciation", post(http::http_score_pronunciation))
    .with_state(state)
    .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}
