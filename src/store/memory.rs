//! In-memory document store used for local runs, demos and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use super::{Document, DocumentStore};
use crate::error::{AppError, Result};

type Collection = BTreeMap<String, Map<String, Value>>;

#[derive(Default)]
pub struct MemoryStore {
  collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
  /// Build from `{"collection": {"id": {...fields}}}`.
  pub fn from_json(root: Value) -> Result<Self> {
    let Value::Object(root) = root else {
      return Err(AppError::Config("fixture root must be an object of collections".into()));
    };
    let mut collections = HashMap::new();
    for (name, docs) in root {
      let Value::Object(docs) = docs else {
        return Err(AppError::Config(format!("fixture collection '{name}' must be an object")));
      };
      let mut coll = Collection::new();
      for (id, data) in docs {
        match data {
          Value::Object(fields) => {
            coll.insert(id, fields);
          }
          _ => return Err(AppError::Config(format!("fixture document '{name}/{id}' must be an object"))),
        }
      }
      collections.insert(name, coll);
    }
    Ok(Self { collections: RwLock::new(collections) })
  }

  /// Load a JSON fixture file from disk.
  pub fn from_fixture_file(path: &str) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .map_err(|e| AppError::Config(format!("cannot read fixture {path}: {e}")))?;
    let value: Value = serde_json::from_str(&raw)
      .map_err(|e| AppError::Config(format!("cannot parse fixture {path}: {e}")))?;
    let store = Self::from_json(value)?;
    info!(target: "store", %path, "Loaded in-memory store fixture");
    Ok(store)
  }
}

#[async_trait]
impl DocumentStore for MemoryStore {
  #[instrument(level = "debug", skip(self))]
  async fn list(&self, collection: &str) -> Result<Vec<Document>> {
    let guard = self.collections.read().await;
    Ok(
      guard
        .get(collection)
        .map(|c| c.iter().map(|(id, data)| Document::new(id.clone(), data.clone())).collect())
        .unwrap_or_default(),
    )
  }

  #[instrument(level = "debug", skip(self))]
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
    let guard = self.collections.read().await;
    Ok(guard.get(collection).and_then(|c| c.get(id)).map(|data| Document::new(id, data.clone())))
  }

  #[instrument(level = "debug", skip(self, data))]
  async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
    let Value::Object(fields) = data else {
      return Err(AppError::Upstream(format!("document {collection}/{id} must be a JSON object")));
    };
    let mut guard = self.collections.write().await;
    guard.entry(collection.to_string()).or_default().insert(id.to_string(), fields);
    Ok(())
  }

  fn name(&self) -> &'static str {
    "memory"
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn fixture_round_trips_through_get_and_list() {
    let store = MemoryStore::from_json(json!({
      "users": { "u2": {"quizLevel": "B1"}, "u1": {"quizLevel": "A2"} }
    }))
    .unwrap();

    let users = store.list("users").await.unwrap();
    assert_eq!(users.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["u1", "u2"]);

    let u2 = store.get("users", "u2").await.unwrap().unwrap();
    assert_eq!(u2.str_field("quizLevel"), Some("B1"));
    assert!(store.get("users", "nope").await.unwrap().is_none());
    assert!(store.list("videos").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn set_replaces_whole_document() {
    let store = MemoryStore::default();
    store.set("recommendations", "u1", json!({"a": 1, "b": 2})).await.unwrap();
    store.set("recommendations", "u1", json!({"a": 3})).await.unwrap();
    let doc = store.get("recommendations", "u1").await.unwrap().unwrap();
    assert_eq!(doc.data.get("a"), Some(&json!(3)));
    assert!(doc.data.get("b").is_none());
  }

  #[test]
  fn fixture_rejects_non_object_documents() {
    let err = MemoryStore::from_json(json!({"users": {"u1": 5}})).err().unwrap();
    assert!(matches!(err, AppError::Config(_)));
  }
}
