//! Domain models: proficiency levels, catalog items, learner profiles and
//! the recommendation records written back to the document store.

use std::{collections::HashSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// CEFR proficiency level, ordered A1 < A2 < ... < C2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Level {
  #[default]
  A1,
  A2,
  B1,
  B2,
  C1,
  C2,
}

impl Level {
  pub const ALL: [Level; 6] = [Level::A1, Level::A2, Level::B1, Level::B2, Level::C1, Level::C2];

  /// Ordinal position on the A1..C2 scale (0..=5).
  pub fn rank(self) -> u8 {
    self as u8
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Level::A1 => "A1",
      Level::A2 => "A2",
      Level::B1 => "B1",
      Level::B2 => "B2",
      Level::C1 => "C1",
      Level::C2 => "C2",
    }
  }

  /// Absolute distance in ranks between two levels.
  pub fn distance(self, other: Level) -> u8 {
    self.rank().abs_diff(other.rank())
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Level {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let upper = s.trim().to_uppercase();
    Level::ALL
      .into_iter()
      .find(|l| l.as_str() == upper)
      .ok_or_else(|| AppError::InvalidLevel(s.to_string()))
  }
}

/// One recommendable unit in canonical shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
  pub id: String,
  pub title: String,
  pub category: String,
  pub level: Level,
  #[serde(default)]
  pub description: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub route: String,
}

/// Per-request view of a learner. Never persisted by the recommender.
#[derive(Clone, Debug, Default)]
pub struct LearnerProfile {
  pub level: Level,
  pub goals: Vec<String>,
  pub completed_ids: HashSet<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecommendation {
  pub id: String,
  pub title: String,
  pub category: String,
  pub level: Level,
  pub score: f64,
  pub description: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub route: String,
}

impl ScoredRecommendation {
  pub fn from_item(item: &CatalogItem, score: f64) -> Self {
    Self {
      id: item.id.clone(),
      title: item.title.clone(),
      category: item.category.clone(),
      level: item.level,
      score,
      description: item.description.clone(),
      kind: item.kind.clone(),
      route: item.route.clone(),
    }
  }
}

/// Document stored per learner in the recommendations collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationDocument {
  pub user_id: String,
  pub recommendations: Vec<ScoredRecommendation>,
  pub user_level: String,
  pub learning_goals: Vec<String>,
  pub generated_at: DateTime<Utc>,
  pub total_recommendations: usize,
}
