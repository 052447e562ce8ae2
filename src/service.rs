//! Core operations shared by the HTTP handlers and batch mode.
//!
//! This includes:
//!   - generating and storing recommendations for one learner or all learners
//!   - reloading the catalog snapshot
//!   - health reporting
//!   - previewing recommendations for an ad hoc profile (nothing is written)
//!   - scoring pronunciation from text or transcribed audio

use std::collections::HashSet;

use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{LearnerProfile, Level, RecommendationDocument, ScoredRecommendation};
use crate::error::{AppError, Result};
use crate::protocol::{HealthOut, PreviewIn, PronunciationIn, PronunciationOut};
use crate::pronunciation;
use crate::recommender::CatalogSnapshot;
use crate::state::AppState;
use crate::store::Document;
use crate::util::trunc_for_log;

/// Totals of one batch run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
  pub total: usize,
  pub succeeded: usize,
  pub failed: usize,
}

/// Learner level, or A1 when absent or unrecognized.
fn learner_level(raw: Option<&str>, user_id: &str) -> Level {
  match raw {
    None => Level::default(),
    Some(s) => s.parse().unwrap_or_else(|e: AppError| {
      warn!(target: "learnpath", %user_id, error = %e, "Unrecognized learner level; ranking as A1");
      Level::default()
    }),
  }
}

/// Build the profile from the user record and the (optional) progress record.
pub fn learner_profile(user: &Document, progress: Option<&Document>) -> LearnerProfile {
  LearnerProfile {
    level: learner_level(user.str_field("quizLevel"), &user.id),
    goals: user.str_list("learningGoals"),
    completed_ids: progress.map(|p| p.str_list("completedLessons")).unwrap_or_default().into_iter().collect(),
  }
}

async fn recommend_and_store(
  state: &AppState,
  snapshot: &CatalogSnapshot,
  user: &Document,
) -> Result<usize> {
  let collections = &state.config.collections;
  let progress = state.store.get(&collections.progress, &user.id).await?;
  let profile = learner_profile(user, progress.as_ref());
  let recommendations = snapshot.recommend(&profile, state.config.recommender.top_n);

  let doc = RecommendationDocument {
    user_id: user.id.clone(),
    total_recommendations: recommendations.len(),
    recommendations,
    user_level: profile.level.to_string(),
    learning_goals: profile.goals.clone(),
    generated_at: Utc::now(),
  };
  let value = serde_json::to_value(&doc).map_err(|e| AppError::Upstream(format!("cannot encode recommendations: {e}")))?;
  state.store.set(&collections.recommendations, &user.id, value).await?;

  for r in &doc.recommendations {
    tracing::debug!(target: "recommender", user_id = %user.id, id = %r.id, score = %format!("{:.2}", r.score), "Recommended");
  }
  Ok(doc.total_recommendations)
}

/// Generate and store recommendations for one learner; returns the count written.
#[instrument(level = "info", skip(state))]
pub async fn generate_for_user(state: &AppState, user_id: Option<&str>) -> Result<usize> {
  let user_id = user_id.map(str::trim).filter(|s| !s.is_empty()).ok_or(AppError::MissingField("userId"))?;
  let snapshot = state.snapshot().await?;

  let user = state
    .store
    .get(&state.config.collections.users, user_id)
    .await?
    .ok_or_else(|| AppError::LearnerNotFound(user_id.to_string()))?;

  let count = recommend_and_store(state, &snapshot, &user).await?;
  info!(target: "learnpath", %user_id, count, version = snapshot.version, "Recommendations generated");
  Ok(count)
}

/// Regenerate recommendations for every learner. A failing learner is logged
/// and counted; the run continues.
#[instrument(level = "info", skip(state))]
pub async fn generate_for_all(state: &AppState) -> Result<BatchSummary> {
  let run_id = Uuid::new_v4();
  let snapshot = state.snapshot().await?;
  let users = state.store.list(&state.config.collections.users).await?;

  let mut summary = BatchSummary::default();
  for user in &users {
    summary.total += 1;
    match recommend_and_store(state, &snapshot, user).await {
      Ok(count) => {
        summary.succeeded += 1;
        info!(target: "learnpath", %run_id, user_id = %user.id, count, "Learner done");
      }
      Err(e) => {
        summary.failed += 1;
        error!(target: "learnpath", %run_id, user_id = %user.id, error = %e, "Learner failed");
      }
    }
  }
  info!(target: "learnpath", %run_id, total = summary.total, succeeded = summary.succeeded, failed = summary.failed, "Batch finished");
  Ok(summary)
}

/// Reload and retrain; returns (item count, snapshot version).
#[instrument(level = "info", skip(state))]
pub async fn reload_content(state: &AppState) -> Result<(usize, u64)> {
  let snap = state.reload().await?;
  Ok((snap.len(), snap.version))
}

pub async fn health(state: &AppState) -> HealthOut {
  let snap = state.current_snapshot().await;
  HealthOut {
    status: "healthy".into(),
    model_loaded: snap.is_some(),
    item_count: snap.as_ref().map(|s| s.len()).unwrap_or(0),
    last_updated: snap.map(|s| s.loaded_at.to_rfc3339()),
  }
}

/// Rank for an ad hoc profile without touching the store.
#[instrument(level = "info", skip(state, req), fields(goals = req.goals.len()))]
pub async fn preview(state: &AppState, req: PreviewIn) -> Result<Vec<ScoredRecommendation>> {
  let snapshot = state.snapshot().await?;
  let level = learner_level(req.level.as_deref().map(str::trim).filter(|s| !s.is_empty()), "preview");
  let profile = LearnerProfile {
    level,
    goals: req.goals,
    completed_ids: req.completed_ids.into_iter().collect::<HashSet<_>>(),
  };
  Ok(snapshot.recommend(&profile, req.n.unwrap_or(state.config.recommender.top_n)))
}

#[instrument(level = "info", skip(state, req))]
pub async fn score_pronunciation(state: &AppState, req: PronunciationIn) -> Result<PronunciationOut> {
  let target_text = req
    .target_text
    .filter(|t| !t.trim().is_empty())
    .ok_or(AppError::MissingField("targetText"))?;

  let user_text = match (req.user_text, req.audio_base64.filter(|a| !a.trim().is_empty())) {
    (Some(text), _) => text,
    (None, Some(audio)) => {
      let transcriber = state
        .transcriber
        .as_ref()
        .ok_or_else(|| AppError::Transcription("speech-to-text is not configured; send userText".into()))?;
      let mime = req.mime.as_deref().unwrap_or("audio/webm");
      transcriber.transcribe_base64(&audio, mime).await?
    }
    (None, None) => return Err(AppError::MissingField("userText")),
  };

  let result = pronunciation::score(&user_text, &target_text);
  info!(
    target: "learnpath",
    user_text = %trunc_for_log(&user_text, 80),
    score = result.score,
    level = ?result.level,
    "Pronunciation scored"
  );
  Ok(PronunciationOut { success: true, user_text, target_text, result })
}
