//! Content-based recommender: one immutable catalog snapshot (items + fitted
//! TF-IDF model + item vectors) scored against a learner profile.
//!
//! score = similarity_weight * cosine(query, item) + level_weight * level_bonus
//! where level_bonus is 0.3 for the same level, 0.15 one level away, else 0.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::config::RecommenderConfig;
use crate::domain::{CatalogItem, LearnerProfile, Level, ScoredRecommendation};
use crate::error::Result;
use crate::features::{item_text, query_text};
use crate::vectorizer::{cosine, SparseVector, TfidfConfig, TfidfModel};

/// Bonus for matching level exactly / one rank away.
pub fn level_bonus(learner: Level, item: Level) -> f64 {
  match learner.distance(item) {
    0 => 0.3,
    1 => 0.15,
    _ => 0.0,
  }
}

#[derive(Clone, Copy, Debug)]
pub struct Weights {
  pub similarity: f64,
  pub level: f64,
}

impl Default for Weights {
  fn default() -> Self {
    Self { similarity: 0.7, level: 0.3 }
  }
}

impl From<&RecommenderConfig> for Weights {
  fn from(cfg: &RecommenderConfig) -> Self {
    Self { similarity: cfg.similarity_weight, level: cfg.level_weight }
  }
}

pub struct CatalogSnapshot {
  pub version: u64,
  pub loaded_at: DateTime<Utc>,
  items: Vec<CatalogItem>,
  model: TfidfModel,
  item_vectors: Vec<SparseVector>,
  weights: Weights,
}

impl CatalogSnapshot {
  /// Fit a new snapshot over `items`. Fails with `EmptyCatalog` for no items.
  #[instrument(level = "info", skip(items, tfidf, weights), fields(items = items.len()))]
  pub fn fit(version: u64, items: Vec<CatalogItem>, tfidf: &TfidfConfig, weights: Weights) -> Result<Self> {
    let texts: Vec<String> = items.iter().map(item_text).collect();
    let (model, item_vectors) = tfidf.fit(&texts)?;
    info!(target: "recommender", version, items = items.len(), features = model.vocabulary_len(), "Model fitted");
    Ok(Self { version, loaded_at: Utc::now(), items, model, item_vectors, weights })
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// Top `n` items by score, completed ones excluded. Ties keep catalog order.
  #[instrument(level = "debug", skip(self, profile), fields(version = self.version, level = %profile.level, goals = profile.goals.len()))]
  pub fn recommend(&self, profile: &LearnerProfile, n: usize) -> Vec<ScoredRecommendation> {
    let query = self.model.transform(&query_text(profile));
    if query.is_zero() {
      debug!(target: "recommender", "Query shares no term with the vocabulary; ranking by level only");
    }

    let mut scored: Vec<(usize, f64)> = self
      .items
      .iter()
      .zip(&self.item_vectors)
      .enumerate()
      .filter(|(_, (item, _))| !profile.completed_ids.contains(&item.id))
      .map(|(i, (item, vector))| {
        let similarity = cosine(&query, vector);
        let bonus = level_bonus(profile.level, item.level);
        (i, self.weights.similarity * similarity + self.weights.level * bonus)
      })
      .collect();

    // stable: equal scores keep their catalog order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(n);

    debug!(target: "recommender", returned = scored.len(), "Recommendations ranked");
    scored
      .into_iter()
      .map(|(i, score)| ScoredRecommendation::from_item(&self.items[i], score))
      .collect()
  }
}
