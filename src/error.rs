//! Error taxonomy shared by the catalog, recommender, store and HTTP layers.
//!
//! Every variant renders as `{"success": false, "error": "..."}` with a status
//! code that matches the failure class.

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::protocol::ErrorOut;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Catalog is empty: no lessons, videos or published items were loaded")]
  EmptyCatalog,

  #[error("Recommendation model is not loaded yet; reload content first")]
  NotFitted,

  #[error("Learner not found: {0}")]
  LearnerNotFound(String),

  #[error("{0} is required")]
  MissingField(&'static str),

  #[error("Unrecognized level '{0}' (expected one of A1, A2, B1, B2, C1, C2)")]
  InvalidLevel(String),

  #[error("Document store unavailable: {0}")]
  Upstream(String),

  #[error("Speech recognition failed: {0}")]
  Transcription(String),

  #[error("Configuration error: {0}")]
  Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::MissingField(_) | AppError::InvalidLevel(_) => StatusCode::BAD_REQUEST,
      AppError::LearnerNotFound(_) => StatusCode::NOT_FOUND,
      AppError::EmptyCatalog => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Upstream(_) | AppError::Transcription(_) => StatusCode::BAD_GATEWAY,
      AppError::NotFitted => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> axum::response::Response {
    let status = self.status();
    let body = ErrorOut { success: false, error: self.to_string() };
    (status, Json(body)).into_response()
  }
}

impl From<reqwest::Error> for AppError {
  fn from(e: reqwest::Error) -> Self {
    AppError::Upstream(e.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_codes_follow_failure_class() {
    assert_eq!(AppError::MissingField("userId").status(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::LearnerNotFound("u1".into()).status(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::NotFitted.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(AppError::Upstream("down".into()).status(), StatusCode::BAD_GATEWAY);
  }

  #[test]
  fn missing_field_message_names_the_field() {
    assert_eq!(AppError::MissingField("targetText").to_string(), "targetText is required");
  }
}
