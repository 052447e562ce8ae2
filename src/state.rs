//! Application state: document store, live catalog snapshot, optional transcriber.
//!
//! The live snapshot is a single `Arc` behind a `RwLock`. Readers clone the
//! `Arc` and drop the lock at once; a reload builds the next snapshot
//! completely and then swaps it in with one short write. Reloads are
//! serialized by `reload_lock`, and a failed reload leaves the old snapshot live.

use std::sync::{
  atomic::{AtomicU64, Ordering},
  Arc,
};

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument};

use crate::catalog::load_catalog;
use crate::config::{AppConfig, StoreBackend};
use crate::error::{AppError, Result};
use crate::recommender::{CatalogSnapshot, Weights};
use crate::seeds::seed_documents;
use crate::store::{DocumentStore, FirestoreStore, MemoryStore};
use crate::transcribe::Transcriber;
use crate::vectorizer::TfidfConfig;

pub struct AppState {
  pub config: AppConfig,
  pub store: Arc<dyn DocumentStore>,
  pub transcriber: Option<Transcriber>,
  snapshot: RwLock<Option<Arc<CatalogSnapshot>>>,
  reload_lock: Mutex<()>,
  next_version: AtomicU64,
}

impl AppState {
  /// Build state from config: pick the store backend and init the transcriber.
  #[instrument(level = "info", skip_all)]
  pub fn from_config(config: AppConfig) -> Result<Self> {
    let store: Arc<dyn DocumentStore> = match config.store.backend {
      StoreBackend::Firestore => Arc::new(FirestoreStore::from_config(&config.store)?),
      StoreBackend::Memory => match &config.store.fixture_path {
        Some(path) => Arc::new(MemoryStore::from_fixture_file(path)?),
        None => {
          info!(target: "learnpath", "No fixture configured; using built-in demo documents");
          Arc::new(MemoryStore::from_json(seed_documents())?)
        }
      },
    };

    let transcriber = Transcriber::from_env();
    if let Some(t) = &transcriber {
      info!(target: "learnpath", base_url = %t.base_url, model = %t.model, "Speech-to-text enabled.");
    } else {
      info!(target: "learnpath", "Speech-to-text disabled (no OPENAI_API_KEY). Pronunciation needs userText.");
    }

    Ok(Self::new(config, store, transcriber))
  }

  pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>, transcriber: Option<Transcriber>) -> Self {
    Self {
      config,
      store,
      transcriber,
      snapshot: RwLock::new(None),
      reload_lock: Mutex::new(()),
      next_version: AtomicU64::new(1),
    }
  }

  /// The live snapshot, or `NotFitted` before the first successful reload.
  pub async fn snapshot(&self) -> Result<Arc<CatalogSnapshot>> {
    self.snapshot.read().await.clone().ok_or(AppError::NotFitted)
  }

  pub async fn current_snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
    self.snapshot.read().await.clone()
  }

  /// Load the catalog, fit a new snapshot, and publish it.
  #[instrument(level = "info", skip(self), fields(store = self.store.name()))]
  pub async fn reload(&self) -> Result<Arc<CatalogSnapshot>> {
    let _guard = self.reload_lock.lock().await;

    let built = async {
      let (items, _report) =
        load_catalog(self.store.as_ref(), &self.config.collections, self.config.catalog.video_route_style).await?;
      let tfidf = TfidfConfig { max_features: self.config.recommender.max_features, ..TfidfConfig::default() };
      let version = self.next_version.fetch_add(1, Ordering::Relaxed);
      CatalogSnapshot::fit(version, items, &tfidf, Weights::from(&self.config.recommender))
    }
    .await;

    match built {
      Ok(snap) => {
        let snap = Arc::new(snap);
        *self.snapshot.write().await = Some(snap.clone());
        info!(target: "learnpath", version = snap.version, items = snap.len(), "Catalog snapshot published");
        Ok(snap)
      }
      Err(e) => {
        error!(target: "learnpath", error = %e, "Reload failed; keeping previous snapshot");
        Err(e)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{LearnerProfile, Level};
  use serde_json::json;

  fn state_with(store: MemoryStore) -> AppState {
    AppState::new(AppConfig::default(), Arc::new(store), None)
  }

  #[tokio::test]
  async fn snapshot_is_not_fitted_before_reload() {
    let state = state_with(MemoryStore::from_json(seed_documents()).unwrap());
    assert!(matches!(state.snapshot().await, Err(AppError::NotFitted)));
    let snap = state.reload().await.unwrap();
    assert_eq!(snap.version, 1);
    assert_eq!(state.snapshot().await.unwrap().len(), 8);
  }

  #[tokio::test]
  async fn failed_reload_keeps_previous_snapshot() {
    let store = Arc::new(MemoryStore::from_json(json!({
      "adminContent": { "a1": {"status": "published", "title": "Stories"} }
    }))
    .unwrap());
    let state = AppState::new(AppConfig::default(), store.clone(), None);
    state.reload().await.unwrap();

    // unpublishing the only record leaves the next load empty
    store.set("adminContent", "a1", json!({"status": "draft", "title": "Stories"})).await.unwrap();
    assert!(matches!(state.reload().await, Err(AppError::EmptyCatalog)));

    let live = state.snapshot().await.unwrap();
    assert_eq!(live.version, 1);
    assert_eq!(live.len(), 1);
  }

  #[tokio::test]
  async fn reload_keeps_record_with_unrecognized_level_at_a1() {
    let store = Arc::new(MemoryStore::from_json(json!({
      "lessonContent": { "g1": {"moduleId": "grammar", "level": "unknown"} }
    }))
    .unwrap());
    let state = AppState::new(AppConfig::default(), store, None);
    let snap = state.reload().await.unwrap();
    let recs = snap.recommend(&LearnerProfile::default(), 5);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].id, "g1");
    assert_eq!(recs[0].level, Level::A1);
  }

  #[tokio::test]
  async fn reload_bumps_version_and_sees_new_items() {
    let store = Arc::new(MemoryStore::from_json(json!({
      "videos": { "v1": {"title": "Idioms"} }
    }))
    .unwrap());
    let state = AppState::new(AppConfig::default(), store.clone(), None);
    let first = state.reload().await.unwrap();
    store.set("videos", "v2", json!({"title": "Phrasal verbs"})).await.unwrap();
    let second = state.reload().await.unwrap();
    assert!(second.version > first.version);
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 2);
  }
}
