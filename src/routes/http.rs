//! HTTP endpoint handlers. These are thin wrappers that forward to the service layer.
//! Each handler is instrumented; failures render through `AppError`.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::error::Result;
use crate::protocol::*;
use crate::service;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(service::health(&state).await)
}

#[instrument(level = "info", skip(state, body), fields(user_id = ?body.user_id))]
pub async fn http_generate_recommendations(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> Result<Json<GenerateOut>> {
  let count = service::generate_for_user(&state, body.user_id.as_deref()).await?;
  Ok(Json(GenerateOut {
    success: true,
    recommendation_count: count,
    message: "Recommendations generated successfully".into(),
  }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_generate_all(State(state): State<Arc<AppState>>) -> Result<Json<BatchOut>> {
  let s = service::generate_for_all(&state).await?;
  Ok(Json(BatchOut { success: true, total: s.total, succeeded: s.succeeded, failed: s.failed }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_reload_content(State(state): State<Arc<AppState>>) -> Result<Json<ReloadOut>> {
  let (item_count, version) = service::reload_content(&state).await?;
  info!(target: "learnpath", item_count, version, "HTTP reload served");
  Ok(Json(ReloadOut { success: true, item_count, version }))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_preview(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PreviewIn>,
) -> Result<impl IntoResponse> {
  Ok(Json(service::preview(&state, body).await?))
}

#[instrument(level = "info", skip(state, body), fields(has_audio = body.audio_base64.is_some()))]
pub async fn http_score_pronunciation(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PronunciationIn>,
) -> Result<Json<PronunciationOut>> {
  Ok(Json(service::score_pronunciation(&state, body).await?))
}
