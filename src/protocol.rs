//! Public request/response structs for the HTTP endpoints (serde ready).
//! Field names are camelCase to match the web client.

use serde::{Deserialize, Serialize};

use crate::pronunciation::ScoreResult;

#[derive(Debug, Serialize)]
pub struct ErrorOut {
  pub success: bool,
  pub error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIn {
  #[serde(default)]
  pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOut {
  pub success: bool,
  pub recommendation_count: usize,
  pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOut {
  pub success: bool,
  pub total: usize,
  pub succeeded: usize,
  pub failed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadOut {
  pub success: bool,
  pub item_count: usize,
  pub version: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
  pub status: String,
  pub model_loaded: bool,
  pub item_count: usize,
  pub last_updated: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewIn {
  #[serde(default)]
  pub level: Option<String>,
  #[serde(default)]
  pub goals: Vec<String>,
  #[serde(default)]
  pub completed_ids: Vec<String>,
  #[serde(default)]
  pub n: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationIn {
  #[serde(default)]
  pub user_text: Option<String>,
  #[serde(default)]
  pub audio_base64: Option<String>,
  #[serde(default)]
  pub mime: Option<String>,
  #[serde(default)]
  pub target_text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationOut {
  pub success: bool,
  pub user_text: String,
  pub target_text: String,
  #[serde(flatten)]
  pub result: ScoreResult,
}
