//! Firestore REST v1 client.
//!
//! Only the three calls the backend needs: list a collection (paginated),
//! get one document, and set (create or replace) one document.
//! Firestore wraps every field in a typed value (`stringValue`, `mapValue`, ...);
//! `decode_value` / `encode_value` translate between that and plain JSON.
//!
//! NOTE: the access token is never logged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
  header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
  StatusCode, Url,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

use super::{Document, DocumentStore};
use crate::config::StoreConfig;
use crate::error::{AppError, Result};

const PAGE_SIZE: u32 = 300;

#[derive(Clone)]
pub struct FirestoreStore {
  client: reqwest::Client,
  base_url: String,
  project_id: String,
  access_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
  #[serde(default)]
  documents: Vec<RawDocument>,
  #[serde(default)]
  next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct RawDocument {
  name: String,
  #[serde(default)]
  fields: Map<String, Value>,
}

impl RawDocument {
  fn into_document(self) -> Document {
    let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
    Document::new(id, decode_fields(&self.fields))
  }
}

impl FirestoreStore {
  /// Build from config; the project id must be set (config or FIRESTORE_PROJECT_ID).
  pub fn from_config(cfg: &StoreConfig) -> Result<Self> {
    let project_id = cfg
      .project_id
      .clone()
      .filter(|p| !p.is_empty())
      .ok_or_else(|| AppError::Config("firestore backend requires store.project_id or FIRESTORE_PROJECT_ID".into()))?;
    let access_token = std::env::var("FIRESTORE_ACCESS_TOKEN").ok().filter(|t| !t.is_empty());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .map_err(|e| AppError::Config(format!("cannot build HTTP client: {e}")))?;

    info!(target: "store", base_url = %cfg.base_url, %project_id, has_token = access_token.is_some(), "Firestore store enabled");
    Ok(Self { client, base_url: cfg.base_url.trim_end_matches('/').to_string(), project_id, access_token })
  }

  fn documents_url(&self) -> String {
    format!("{}/projects/{}/databases/(default)/documents", self.base_url, self.project_id)
  }

  /// Documents root plus `segments`, each percent-encoded as one path segment.
  fn document_url(&self, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(&self.documents_url())
      .map_err(|e| AppError::Config(format!("invalid firestore base url '{}': {e}", self.base_url)))?;
    url
      .path_segments_mut()
      .map_err(|_| AppError::Config(format!("firestore base url '{}' cannot take a path", self.base_url)))?
      .extend(segments);
    Ok(url)
  }

  fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
    let req = self
      .client
      .request(method, url)
      .header(USER_AGENT, "learnpath-backend/0.1")
      .header(CONTENT_TYPE, "application/json");
    match &self.access_token {
      Some(token) => req.header(AUTHORIZATION, format!("Bearer {token}")),
      None => req,
    }
  }
}

async fn error_for_status(res: reqwest::Response) -> Result<reqwest::Response> {
  if res.status().is_success() {
    return Ok(res);
  }
  let status = res.status();
  let body = res.text().await.unwrap_or_default();
  let msg = extract_firestore_error(&body).unwrap_or(body);
  Err(AppError::Upstream(format!("Firestore HTTP {status}: {msg}")))
}

#[async_trait]
impl DocumentStore for FirestoreStore {
  #[instrument(level = "info", skip(self))]
  async fn list(&self, collection: &str) -> Result<Vec<Document>> {
    let url = self.document_url(&[collection])?;
    let mut out = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
      let mut req = self.request(reqwest::Method::GET, url.clone()).query(&[("pageSize", PAGE_SIZE.to_string())]);
      if let Some(t) = &page_token {
        req = req.query(&[("pageToken", t)]);
      }
      let res = error_for_status(req.send().await?).await?;
      let page: ListResponse = res.json().await?;
      out.extend(page.documents.into_iter().map(RawDocument::into_document));

      match page.next_page_token.filter(|t| !t.is_empty()) {
        Some(t) => page_token = Some(t),
        None => break,
      }
    }
    debug!(target: "store", %collection, count = out.len(), "Listed collection");
    Ok(out)
  }

  #[instrument(level = "info", skip(self))]
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
    let url = self.document_url(&[collection, id])?;
    let res = self.request(reqwest::Method::GET, url).send().await?;
    if res.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let raw: RawDocument = error_for_status(res).await?.json().await?;
    Ok(Some(raw.into_document()))
  }

  #[instrument(level = "info", skip(self, data))]
  async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
    let Value::Object(fields) = data else {
      return Err(AppError::Upstream(format!("document {collection}/{id} must be a JSON object")));
    };
    let url = self.document_url(&[collection, id])?;
    let body = json!({ "fields": encode_fields(&fields) });
    let res = self.request(reqwest::Method::PATCH, url).json(&body).send().await?;
    error_for_status(res).await?;
    Ok(())
  }

  fn name(&self) -> &'static str {
    "firestore"
  }
}

fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
  fields.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect()
}

/// Firestore typed value -> plain JSON.
pub fn decode_value(v: &Value) -> Value {
  let Some(obj) = v.as_object() else { return Value::Null };
  let Some((kind, inner)) = obj.iter().next() else { return Value::Null };
  match kind.as_str() {
    "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
    "booleanValue" => inner.clone(),
    // integers travel as strings
    "integerValue" => inner
      .as_str()
      .and_then(|s| s.parse::<i64>().ok())
      .map(Value::from)
      .unwrap_or_else(|| inner.clone()),
    "doubleValue" => inner.clone(),
    "arrayValue" => Value::Array(
      inner
        .get("values")
        .and_then(Value::as_array)
        .map(|xs| xs.iter().map(decode_value).collect())
        .unwrap_or_default(),
    ),
    "mapValue" => Value::Object(
      inner
        .get("fields")
        .and_then(Value::as_object)
        .map(decode_fields)
        .unwrap_or_default(),
    ),
    "geoPointValue" => inner.clone(),
    _ => Value::Null,
  }
}

fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
  fields.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect()
}

/// Plain JSON -> Firestore typed value.
pub fn encode_value(v: &Value) -> Value {
  match v {
    Value::Null => json!({ "nullValue": null }),
    Value::Bool(b) => json!({ "booleanValue": b }),
    Value::Number(n) => match n.as_i64() {
      Some(i) => json!({ "integerValue": i.to_string() }),
      None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
    },
    Value::String(s) => json!({ "stringValue": s }),
    Value::Array(xs) => json!({ "arrayValue": { "values": xs.iter().map(encode_value).collect::<Vec<_>>() } }),
    Value::Object(m) => json!({ "mapValue": { "fields": encode_fields(m) } }),
  }
}

fn extract_firestore_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
