//! LearnPath · Recommendation & Pronunciation Backend
//!
//! - Axum HTTP API (recommendations, catalog reload, health, pronunciation)
//! - Content-based recommender (TF-IDF + level bonus) over a document store
//! - Batch mode that regenerates recommendations for every learner
//!
//! Important env variables:
//!   PORT                    : u16 (default 5000)
//!   RUN_MODE                : "serve" (default) or "batch"
//!   BATCH_USER_ID           : in batch mode, regenerate only this learner
//!   APP_CONFIG_PATH         : path to TOML config
//!   STORE_BACKEND           : "memory" (default) or "firestore"
//!   STORE_FIXTURE_PATH      : JSON fixture for the memory store
//!   FIRESTORE_PROJECT_ID    : required for the firestore backend
//!   FIRESTORE_ACCESS_TOKEN  : bearer token for Firestore REST
//!   OPENAI_API_KEY          : enables speech-to-text for audio pronunciation input
//!   LOG_LEVEL               : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT              : "pretty" (default) or "json"

mod catalog;
mod config;
mod domain;
mod error;
mod features;
mod pronunciation;
mod protocol;
mod recommender;
mod routes;
mod seeds;
mod service;
mod state;
mod store;
mod telemetry;
mod transcribe;
mod util;
mod vectorizer;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::load_config_from_env;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = load_config_from_env();
  let state = Arc::new(AppState::from_config(config)?);

  // Initial fit. A server can still start without a catalog and be reloaded later.
  let loaded = state.reload().await;

  if std::env::var("RUN_MODE").as_deref() == Ok("batch") {
    loaded?;
    return run_batch(&state).await;
  }
  if let Err(e) = loaded {
    warn!(target: "learnpath", error = %e, "Starting without a fitted model; call /api/reload-content");
  }

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "learnpath", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  Ok(())
}

async fn run_batch(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
  match std::env::var("BATCH_USER_ID").ok().filter(|u| !u.is_empty()) {
    Some(user_id) => {
      let count = service::generate_for_user(state, Some(&user_id)).await?;
      info!(target: "learnpath", %user_id, count, "Batch (single learner) finished");
    }
    None => {
      let summary = service::generate_for_all(state).await?;
      if summary.failed > 0 {
        error!(target: "learnpath", failed = summary.failed, total = summary.total, "Some learners failed");
      }
    }
  }
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "learnpath", error = %e, "Failed to listen for shutdown signal");
  }
  info!(target: "learnpath", "Shutdown signal received");
}
