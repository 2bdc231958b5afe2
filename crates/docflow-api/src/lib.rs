//! JSON REST API for docflow.
//!
//! Exposes an axum [`Router`] backed by any
//! [`DocumentStore`](docflow_core::store::DocumentStore). Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", docflow_api::api_router(AppState::new(engine)))
//! ```

pub mod documents;
pub mod error;
pub mod probe;
pub mod transitions;
pub mod validate;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use docflow_core::store::DocumentStore;
use docflow_engine::{BatchProcessor, ContentionProbe, TransitionEngine};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
  pub batch: BatchProcessor<S>,
  pub probe: Arc<ContentionProbe<S>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store: self.store.clone(),
      batch: self.batch.clone(),
      probe: self.probe.clone(),
    }
  }
}

impl<S> AppState<S>
where
  S: DocumentStore + 'static,
{
  /// Build every handler dependency over one engine, so HTTP transitions
  /// share its lock table with anything else holding a clone of it.
  pub fn new(engine: TransitionEngine<S>) -> Self {
    let batch = BatchProcessor::new(engine);
    Self {
      store: batch.engine().store().clone(),
      probe: Arc::new(ContentionProbe::new(batch.clone())),
      batch,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: DocumentStore + 'static,
{
  Router::new()
    // Documents
    .route("/documents", post(documents::create::<S>))
    .route("/documents/{id}", get(documents::get_one::<S>))
    .route("/documents/batch", post(documents::get_many::<S>))
    // Transitions
    .route("/documents/submit", post(transitions::submit::<S>))
    .route("/documents/approve", post(transitions::approve::<S>))
    // Probe
    .route("/test/{id}", post(probe::handler::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
