//! Document store seam: collections of JSON documents keyed by id.
//!
//! Two backends exist:
//!   - `MemoryStore`: in-process maps, seeded from demo data or a JSON fixture
//!   - `FirestoreStore`: Firestore REST v1 over reqwest

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

/// One record read from a collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
  pub id: String,
  pub data: Map<String, Value>,
}

impl Document {
  pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
    Self { id: id.into(), data }
  }

  /// Top-level string field, treating empty strings as absent.
  pub fn str_field(&self, key: &str) -> Option<&str> {
    self.data.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
  }

  /// Top-level array of strings; non-string entries are skipped.
  pub fn str_list(&self, key: &str) -> Vec<String> {
    self
      .data
      .get(key)
      .and_then(Value::as_array)
      .map(|xs| xs.iter().filter_map(Value::as_str).map(str::to_string).collect())
      .unwrap_or_default()
  }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
  /// All documents of a collection, in a stable backend-defined order.
  async fn list(&self, collection: &str) -> Result<Vec<Document>>;

  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

  /// Create or fully replace a document.
  async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()>;

  /// Short backend name for logs.
  fn name(&self) -> &'static str;
}
