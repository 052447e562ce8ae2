//! Application configuration loaded from TOML (APP_CONFIG_PATH) with env overrides.
//!
//! Every section is optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [recommender]
//! top_n = 10
//! max_features = 1000
//! similarity_weight = 0.7
//! level_weight = 0.3
//!
//! [catalog]
//! video_route_style = "flat"   # or "module_scoped"
//!
//! [store]
//! backend = "memory"           # or "firestore"
//! fixture_path = "./fixtures/demo.json"
//! project_id = "my-project"
//! ```

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub recommender: RecommenderConfig,
  #[serde(default)]
  pub catalog: CatalogConfig,
  #[serde(default)]
  pub collections: Collections,
  #[serde(default)]
  pub store: StoreConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
  /// How many recommendations are written per learner.
  pub top_n: usize,
  /// Vocabulary cap for the TF-IDF fit.
  pub max_features: usize,
  pub similarity_weight: f64,
  pub level_weight: f64,
}

impl Default for RecommenderConfig {
  fn default() -> Self {
    Self { top_n: 10, max_features: 1000, similarity_weight: 0.7, level_weight: 0.3 }
  }
}

/// How video routes are built. Both forms exist in deployed frontends.
#[derive(Clone, Copy, Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VideoRouteStyle {
  /// `/videos/{id}`
  #[default]
  Flat,
  /// `/modules/{category}/video/{id}`
  ModuleScoped,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
  pub video_route_style: VideoRouteStyle,
}

/// Collection names in the document store.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Collections {
  pub lessons: String,
  pub videos: String,
  pub admin_content: String,
  pub users: String,
  pub progress: String,
  pub recommendations: String,
}

impl Default for Collections {
  fn default() -> Self {
    Self {
      lessons: "lessonContent".into(),
      videos: "videos".into(),
      admin_content: "adminContent".into(),
      users: "users".into(),
      progress: "userProgress".into(),
      recommendations: "recommendations".into(),
    }
  }
}

#[derive(Clone, Copy, Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
  #[default]
  Memory,
  Firestore,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  pub backend: StoreBackend,
  /// JSON fixture for the memory backend; built-in demo data when absent.
  pub fixture_path: Option<String>,
  pub project_id: Option<String>,
  pub base_url: String,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      backend: StoreBackend::Memory,
      fixture_path: None,
      project_id: None,
      base_url: "https://firestore.googleapis.com/v1".into(),
    }
  }
}

impl AppConfig {
  /// Apply STORE_BACKEND / FIRESTORE_* overrides on top of the file values.
  pub fn apply_env_overrides(&mut self) {
    if let Ok(b) = std::env::var("STORE_BACKEND") {
      match b.to_lowercase().as_str() {
        "memory" => self.store.backend = StoreBackend::Memory,
        "firestore" => self.store.backend = StoreBackend::Firestore,
        other => error!(target: "learnpath", backend = %other, "Unknown STORE_BACKEND; keeping configured value"),
      }
    }
    if let Ok(p) = std::env::var("FIRESTORE_PROJECT_ID") {
      self.store.project_id = Some(p);
    }
    if let Ok(u) = std::env::var("FIRESTORE_BASE_URL") {
      self.store.base_url = u;
    }
    if let Ok(f) = std::env::var("STORE_FIXTURE_PATH") {
      self.store.fixture_path = Some(f);
    }
  }
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Load config from APP_CONFIG_PATH, then apply env overrides.
/// On any read/parse error the defaults are used and the error is logged.
pub fn load_config_from_env() -> AppConfig {
  let mut cfg = match std::env::var("APP_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse_config(&s) {
        Ok(cfg) => {
          info!(target: "learnpath", %path, "Loaded app config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "learnpath", %path, error = %e, "Failed to parse TOML config; using defaults");
          AppConfig::default()
        }
      },
      Err(e) => {
        error!(target: "learnpath", %path, error = %e, "Failed to read TOML config file; using defaults");
        AppConfig::default()
      }
    },
    Err(_) => AppConfig::default(),
  };
  cfg.apply_env_overrides();
  cfg
}
