//! The transition engine: one validated transition on one document.

use std::{sync::Arc, time::Duration};

use docflow_core::{
  document::{DocumentId, DocumentStatus, HistoryAction},
  outcome::Outcome,
  store::{Applied, DocumentStore},
  transition::{Transition, TransitionRequest},
};
use tokio::time::Instant;

use crate::{config::EngineConfig, locks::DocumentLocks};

/// Applies transitions under the per-document lock and maps the store's
/// verdict onto an [`Outcome`].
///
/// Cloning is cheap; clones share the store and the lock table.
pub struct TransitionEngine<S> {
  store:   Arc<S>,
  locks:   Arc<DocumentLocks>,
  timeout: Duration,
}

impl<S> Clone for TransitionEngine<S> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      locks:   self.locks.clone(),
      timeout: self.timeout,
    }
  }
}

impl<S: DocumentStore> TransitionEngine<S> {
  pub fn new(store: Arc<S>, config: &EngineConfig) -> Self {
    Self::with_locks(
      store,
      Arc::new(DocumentLocks::new()),
      config.transaction_timeout(),
    )
  }

  /// Build an engine over an existing lock table, e.g. one shared with a
  /// second engine instance.
  pub fn with_locks(store: Arc<S>, locks: Arc<DocumentLocks>, timeout: Duration) -> Self {
    Self { store, locks, timeout }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn locks(&self) -> &Arc<DocumentLocks> { &self.locks }

  /// Attempt to move document `id` from `required_from` to `to`.
  ///
  /// An illegal `(required_from, to, action)` triple is reported as
  /// `INTERNAL` without touching the store.
  pub async fn attempt_transition(
    &self,
    id: DocumentId,
    required_from: DocumentStatus,
    to: DocumentStatus,
    action: HistoryAction,
    actor: &str,
    comment: Option<&str>,
  ) -> Outcome {
    match Transition::new(required_from, to, action) {
      Ok(transition) => {
        self
          .attempt(TransitionRequest::new(id, transition, actor, comment.map(str::to_owned)))
          .await
      }
      Err(e) => {
        tracing::error!(document_id = id, error = %e, "rejected illegal transition request");
        Outcome::internal(id, e)
      }
    }
  }

  /// Attempt an already-validated transition.
  ///
  /// Waiting for the document's lock and the store call share one deadline.
  pub async fn attempt(&self, request: TransitionRequest) -> Outcome {
    let id = request.document_id;
    let deadline = Instant::now() + self.timeout;

    let Ok(_guard) = tokio::time::timeout_at(deadline, self.locks.lock(id)).await else {
      tracing::error!(
        document_id = id,
        timeout_ms = self.timeout.as_millis() as u64,
        "timed out waiting for document lock"
      );
      return Outcome::internal(
        id,
        format!("document lock not acquired within {:?}", self.timeout),
      );
    };
    self.apply_until(request, deadline).await
  }

  /// Apply `request` assuming the caller already holds the document's lock.
  pub(crate) async fn apply_held(&self, request: TransitionRequest) -> Outcome {
    self.apply_until(request, Instant::now() + self.timeout).await
  }

  async fn apply_until(&self, request: TransitionRequest, deadline: Instant) -> Outcome {
    let id = request.document_id;
    let transition = request.transition;

    let applied = match tokio::time::timeout_at(
      deadline,
      self.store.apply_transition(request),
    )
    .await
    {
      Ok(Ok(applied)) => applied,
      Ok(Err(e)) => {
        tracing::error!(document_id = id, error = %e, "transition failed in store");
        return Outcome::internal(id, e);
      }
      Err(_) => {
        tracing::error!(
          document_id = id,
          timeout_ms = self.timeout.as_millis() as u64,
          "transition timed out"
        );
        return Outcome::internal(id, format!("transition timed out after {:?}", self.timeout));
      }
    };

    match applied {
      Applied::Advanced(document) => {
        tracing::info!(
          document_id = id,
          status = %document.status,
          "document transitioned"
        );
        Outcome::success(document, transition)
      }
      Applied::Missing => {
        tracing::debug!(document_id = id, "transition target not found");
        Outcome::not_found(id)
      }
      Applied::StatusMismatch { actual } => {
        tracing::warn!(
          document_id = id,
          %actual,
          expected = %transition.from(),
          "illegal status for transition"
        );
        Outcome::conflict(id, actual, transition.from())
      }
      Applied::RejectedByRegistry { reason } => {
        tracing::error!(document_id = id, %reason, "approval record not created");
        Outcome::registry_error(id, reason)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use chrono::{SubsecRound as _, Utc};
  use docflow_core::{
    document::{DocumentStatus, HistoryAction, NewDocument},
    outcome::OutcomeStatus,
    store::DocumentStore,
  };
  use docflow_store_sqlite::SqliteStore;

  use super::*;
  use crate::testing::{Fault, FaultyStore, engine, engine_over};

  async fn submitted_doc(engine: &TransitionEngine<SqliteStore>) -> i64 {
    let doc = engine
      .store()
      .create_document(NewDocument::new("Author", "Spec", "alice"))
      .await
      .unwrap();
    let outcome = engine.attempt(TransitionRequest::new(doc.id, Transition::SUBMIT, "alice", None)).await;
    assert!(outcome.is_success(), "{outcome:?}");
    doc.id
  }

  #[tokio::test]
  async fn submit_succeeds_once_then_conflicts() {
    let engine = engine().await;
    let doc = engine
      .store()
      .create_document(NewDocument::new("Author", "Memo", "alice"))
      .await
      .unwrap();

    let first = engine
      .attempt_transition(
        doc.id,
        DocumentStatus::Draft,
        DocumentStatus::Submitted,
        HistoryAction::Submit,
        "bob",
        None,
      )
      .await;
    assert_eq!(first.status, OutcomeStatus::Success);
    assert_eq!(first.document.as_ref().unwrap().status, DocumentStatus::Submitted);

    let second = engine
      .attempt_transition(
        doc.id,
        DocumentStatus::Draft,
        DocumentStatus::Submitted,
        HistoryAction::Submit,
        "bob",
        None,
      )
      .await;
    assert_eq!(second.status, OutcomeStatus::Conflict);
    assert!(second.message.contains("SUBMITTED"), "{}", second.message);
  }

  #[tokio::test]
  async fn approve_creates_history_and_record_after_call_start() {
    let engine = engine().await;
    let id = submitted_doc(&engine).await;
    let started = Utc::now().trunc_subsecs(6);

    let outcome = engine
      .attempt(TransitionRequest::new(id, Transition::APPROVE, "carol", Some("ok".into())))
      .await;
    assert!(outcome.is_success(), "{outcome:?}");

    let doc = outcome.document.unwrap();
    let approvals: Vec<_> = doc
      .history
      .iter()
      .filter(|h| h.action == HistoryAction::Approve)
      .collect();
    assert_eq!(approvals.len(), 1);
    assert!(approvals[0].timestamp >= started);

    let records = engine.store().approval_records(id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].approved_by, "carol");
    assert!(records[0].approved_at >= started);
  }

  #[tokio::test]
  async fn missing_document_is_not_found() {
    let engine = engine().await;
    let outcome = engine
      .attempt(TransitionRequest::new(999_999, Transition::SUBMIT, "bob", None))
      .await;
    assert_eq!(outcome.status, OutcomeStatus::NotFound);
    assert_eq!(outcome.id, 999_999);
  }

  #[tokio::test]
  async fn illegal_request_is_internal_and_touches_nothing() {
    let engine = engine().await;
    let doc = engine
      .store()
      .create_document(NewDocument::new("Author", "Skip", "alice"))
      .await
      .unwrap();

    let outcome = engine
      .attempt_transition(
        doc.id,
        DocumentStatus::Draft,
        DocumentStatus::Approved,
        HistoryAction::Approve,
        "bob",
        None,
      )
      .await;
    assert_eq!(outcome.status, OutcomeStatus::Internal);

    let after = engine.store().get_document(doc.id).await.unwrap().unwrap();
    assert_eq!(after.status, DocumentStatus::Draft);
  }

  #[tokio::test]
  async fn registry_rejection_maps_to_registry_error() {
    let engine = engine_over(Fault::RejectRegistry).await;
    let outcome = engine
      .attempt(TransitionRequest::new(1, Transition::APPROVE, "bob", None))
      .await;
    assert_eq!(outcome.status, OutcomeStatus::RegistryError);
    assert!(outcome.document.is_none());
  }

  #[tokio::test]
  async fn store_failure_maps_to_internal() {
    let engine = engine_over(Fault::Fail).await;
    let outcome = engine
      .attempt(TransitionRequest::new(1, Transition::SUBMIT, "bob", None))
      .await;
    assert_eq!(outcome.status, OutcomeStatus::Internal);
  }

  #[tokio::test]
  async fn timeout_maps_to_internal_not_conflict() {
    let store = Arc::new(FaultyStore::new(Fault::Stall(Duration::from_millis(200))).await);
    let engine = TransitionEngine::with_locks(
      store,
      Arc::new(DocumentLocks::new()),
      Duration::from_millis(20),
    );
    let outcome = engine
      .attempt(TransitionRequest::new(1, Transition::SUBMIT, "bob", None))
      .await;
    assert_eq!(outcome.status, OutcomeStatus::Internal);
    assert!(outcome.message.contains("timed out"), "{}", outcome.message);
  }

  #[tokio::test]
  async fn waiting_on_a_held_lock_is_bounded() {
    let store = engine().await.store().clone();
    let doc = store
      .create_document(NewDocument::new("Author", "Busy", "alice"))
      .await
      .unwrap();
    let engine = TransitionEngine::with_locks(
      store.clone(),
      Arc::new(DocumentLocks::new()),
      Duration::from_millis(20),
    );

    let _held = engine.locks().lock(doc.id).await;
    let outcome = tokio::time::timeout(
      Duration::from_secs(1),
      engine.attempt(TransitionRequest::new(doc.id, Transition::SUBMIT, "bob", None)),
    )
    .await
    .expect("attempt gave up on the lock");

    assert_eq!(outcome.status, OutcomeStatus::Internal);
    assert!(outcome.message.contains("lock"), "{}", outcome.message);
    let after = store.get_document(doc.id).await.unwrap().unwrap();
    assert_eq!(after.status, DocumentStatus::Draft);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_approvals_have_one_winner() {
    let engine = engine().await;
    let id = submitted_doc(&engine).await;

    let attempts: Vec<_> = (0..8)
      .map(|i| {
        let engine = engine.clone();
        tokio::spawn(async move {
          engine
            .attempt(TransitionRequest::new(id, Transition::APPROVE, format!("approver-{i}"), None))
            .await
        })
      })
      .collect();

    let mut statuses = Vec::new();
    for attempt in attempts {
      statuses.push(attempt.await.unwrap().status);
    }

    assert_eq!(statuses.iter().filter(|s| **s == OutcomeStatus::Success).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == OutcomeStatus::Conflict).count(), 7);
    assert_eq!(engine.store().approval_records(id).await.unwrap().len(), 1);
  }
}
