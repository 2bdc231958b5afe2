//! Server assembly for docflow: configuration, the document generator, and
//! the top-level router.

use std::{path::PathBuf, time::Instant};

use axum::Router;
use docflow_api::AppState;
use docflow_core::{document::NewDocument, store::DocumentStore};
use docflow_engine::{DrainerConfig, EngineConfig};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `DOCFLOW_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub engine:     EngineConfig,
  pub drainer:    DrainerConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("docflow.db"),
      engine:     EngineConfig::default(),
      drainer:    DrainerConfig::default(),
    }
  }
}

impl ServerConfig {
  /// Layer `file` (if present) under the environment. Nested keys use `__`,
  /// e.g. `DOCFLOW_DRAINER__BATCH_SIZE=500`.
  pub fn load<T>(file: T) -> Result<Self, config::ConfigError>
  where
    T: config::Source + Send + Sync + 'static,
  {
    config::Config::builder()
      .add_source(file)
      .add_source(
        config::Environment::with_prefix("DOCFLOW")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full HTTP surface: the API under `/api`, wrapped in request tracing.
pub fn app<S>(state: AppState<S>) -> Router
where
  S: DocumentStore + 'static,
{
  Router::new()
    .nest("/api", docflow_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Generator ────────────────────────────────────────────────────────────────

const GENERATOR_AUTHOR: &str = "Generator";
const GENERATOR_INITIATOR: &str = "SYSTEM";

/// Insert `count` drafts titled `Document 1..=count`. Individual failures
/// are logged and skipped; returns how many were created.
pub async fn generate<S: DocumentStore>(store: &S, count: usize) -> usize {
  let started = Instant::now();
  let step = (count / 10).max(1);
  let mut created = 0;

  tracing::info!(count, "generating documents");
  for i in 1..=count {
    let input = NewDocument::new(GENERATOR_AUTHOR, format!("Document {i}"), GENERATOR_INITIATOR);
    match store.create_document(input).await {
      Ok(_) => created += 1,
      Err(e) => tracing::error!(index = i, error = %e, "failed to create document"),
    }
    if i % step == 0 {
      tracing::info!(done = i, total = count, "generation progress");
    }
  }
  tracing::info!(
    created,
    requested = count,
    elapsed_ms = started.elapsed().as_millis() as u64,
    "generation finished"
  );
  created
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use config::{File, FileFormat};
  use docflow_core::document::DocumentStatus;
  use docflow_engine::TransitionEngine;
  use docflow_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = ServerConfig::load(File::from_str("", FileFormat::Toml)).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.engine.transaction_timeout_ms, 5000);
    assert_eq!(cfg.drainer.batch_size, 100);
    assert!(!cfg.drainer.submit_enabled);
  }

  #[test]
  fn nested_sections_override_defaults() {
    let toml = r#"
      port = 9000
      store_path = "/var/lib/docflow/docflow.db"

      [engine]
      transaction_timeout_ms = 250

      [drainer]
      batch_size = 500
      approve_enabled = true
    "#;
    let cfg = ServerConfig::load(File::from_str(toml, FileFormat::Toml)).unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/docflow/docflow.db"));
    assert_eq!(cfg.engine.transaction_timeout_ms, 250);
    assert_eq!(cfg.drainer.batch_size, 500);
    assert!(cfg.drainer.approve_enabled);
    assert!(!cfg.drainer.submit_enabled);
  }

  #[tokio::test]
  async fn generate_creates_numbered_drafts() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    assert_eq!(generate(&store, 3).await, 3);

    let docs = store.get_documents(vec![1, 2, 3]).await.unwrap();
    let titles: Vec<_> = docs.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, ["Document 1", "Document 2", "Document 3"]);
    assert!(docs.iter().all(|d| d.status == DocumentStatus::Draft));
    assert!(docs.iter().all(|d| d.author == "Generator" && d.initiator == "SYSTEM"));
  }

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let app = app(AppState::new(TransitionEngine::new(store, &EngineConfig::default())));

    let req = Request::builder()
      .uri("/api/documents/1")
      .body(Body::empty())
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = Request::builder()
      .method("POST")
      .uri("/documents")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
