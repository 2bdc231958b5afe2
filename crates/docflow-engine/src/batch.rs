//! Ordered, failure-isolated batch processing.

use std::time::Instant;

use docflow_core::{
  document::DocumentId,
  outcome::{Outcome, OutcomeTally},
  store::DocumentStore,
  transition::{Direction, TransitionRequest},
};

use crate::engine::TransitionEngine;

/// Runs the [`TransitionEngine`] over a list of document ids.
///
/// Items are processed one at a time, each in its own transaction. A
/// conflict, fault, or even a panic on one item never affects another, and
/// the result always has exactly one [`Outcome`] per input id, in input
/// order.
pub struct BatchProcessor<S> {
  engine: TransitionEngine<S>,
}

impl<S> Clone for BatchProcessor<S> {
  fn clone(&self) -> Self { Self { engine: self.engine.clone() } }
}

impl<S> BatchProcessor<S>
where
  S: DocumentStore + 'static,
{
  pub fn new(engine: TransitionEngine<S>) -> Self { Self { engine } }

  pub fn engine(&self) -> &TransitionEngine<S> { &self.engine }

  /// Move every id from `DRAFT` to `SUBMITTED`.
  pub async fn submit(
    &self,
    ids: &[DocumentId],
    actor: &str,
    comment: Option<&str>,
  ) -> Vec<Outcome> {
    self.process_batch(ids, actor, comment, Direction::Submit).await
  }

  /// Move every id from `SUBMITTED` to `APPROVED`, creating approval records.
  pub async fn approve(
    &self,
    ids: &[DocumentId],
    actor: &str,
    comment: Option<&str>,
  ) -> Vec<Outcome> {
    self.process_batch(ids, actor, comment, Direction::Approve).await
  }

  pub async fn process_batch(
    &self,
    ids: &[DocumentId],
    actor: &str,
    comment: Option<&str>,
    direction: Direction,
  ) -> Vec<Outcome> {
    let started = Instant::now();
    let transition = direction.transition();
    let mut outcomes = Vec::with_capacity(ids.len());

    for &id in ids {
      let item_started = Instant::now();
      let engine = self.engine.clone();
      let request = TransitionRequest::new(id, transition, actor, comment.map(str::to_owned));

      // A task per item turns a panic into a JoinError instead of unwinding
      // through the whole batch.
      let outcome = match tokio::spawn(async move { engine.attempt(request).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
          tracing::error!(document_id = id, error = %e, "batch item aborted");
          Outcome::internal(id, "unexpected failure while processing document")
        }
      };

      tracing::debug!(
        document_id = id,
        status = ?outcome.status,
        elapsed_ms = item_started.elapsed().as_millis() as u64,
        "batch item processed"
      );
      outcomes.push(outcome);
    }

    let tally: OutcomeTally = outcomes.iter().collect();
    tracing::info!(
      %direction,
      %actor,
      total = tally.total(),
      success = tally.success,
      conflict = tally.conflict,
      not_found = tally.not_found,
      registry_error = tally.registry_error,
      internal = tally.internal,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "batch finished"
    );

    outcomes
  }
}

#[cfg(test)]
mod tests {
  use docflow_core::{document::DocumentStatus, outcome::OutcomeStatus};

  use super::*;
  use crate::testing::{Fault, drafts, engine, engine_over};

  fn statuses(outcomes: &[Outcome]) -> Vec<OutcomeStatus> {
    outcomes.iter().map(|o| o.status).collect()
  }

  #[tokio::test]
  async fn submit_batch_reports_each_item_in_order() {
    let batch = BatchProcessor::new(engine().await);
    let ids = drafts(batch.engine(), 3).await;
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    // Push `c` all the way to APPROVED first.
    batch.submit(&[c], "setup", None).await;
    batch.approve(&[c], "setup", None).await;

    let outcomes = batch.submit(&[a, b, c, 999_999], "bob", Some("test")).await;
    assert_eq!(
      statuses(&outcomes),
      vec![
        OutcomeStatus::Success,
        OutcomeStatus::Success,
        OutcomeStatus::Conflict,
        OutcomeStatus::NotFound,
      ]
    );
    let ids_out: Vec<_> = outcomes.iter().map(|o| o.id).collect();
    assert_eq!(ids_out, vec![a, b, c, 999_999]);
    assert!(outcomes[2].message.contains("APPROVED"), "{}", outcomes[2].message);
  }

  #[tokio::test]
  async fn approve_batch_creates_records_only_for_successes() {
    let batch = BatchProcessor::new(engine().await);
    let store = batch.engine().store().clone();
    let ids = drafts(batch.engine(), 3).await;
    batch.submit(&ids[..2], "alice", None).await;

    let outcomes = batch.approve(&ids, "bob", None).await;
    assert_eq!(
      statuses(&outcomes),
      vec![OutcomeStatus::Success, OutcomeStatus::Success, OutcomeStatus::Conflict]
    );

    assert_eq!(store.approval_records(ids[0]).await.unwrap().len(), 1);
    assert_eq!(store.approval_records(ids[1]).await.unwrap().len(), 1);
    assert!(store.approval_records(ids[2]).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn duplicate_ids_are_processed_independently() {
    let batch = BatchProcessor::new(engine().await);
    let ids = drafts(batch.engine(), 1).await;

    let outcomes = batch.submit(&[ids[0], ids[0]], "alice", None).await;
    assert_eq!(
      statuses(&outcomes),
      vec![OutcomeStatus::Success, OutcomeStatus::Conflict]
    );
  }

  #[tokio::test]
  async fn empty_batch_returns_empty_report() {
    let batch = BatchProcessor::new(engine().await);
    assert!(batch.approve(&[], "alice", None).await.is_empty());
  }

  #[tokio::test]
  async fn registry_errors_do_not_abort_the_batch() {
    let batch = BatchProcessor::new(engine_over(Fault::RejectRegistry).await);
    let ids = drafts(batch.engine(), 2).await;

    let submitted = batch.submit(&ids, "alice", None).await;
    assert!(submitted.iter().all(Outcome::is_success));

    let outcomes = batch.approve(&ids, "bob", None).await;
    assert_eq!(
      statuses(&outcomes),
      vec![OutcomeStatus::RegistryError, OutcomeStatus::RegistryError]
    );

    let store = batch.engine().store();
    for id in ids {
      let doc = store.get_document(id).await.unwrap().unwrap();
      assert_eq!(doc.status, DocumentStatus::Submitted);
    }
  }

  #[tokio::test]
  async fn panic_on_one_item_becomes_internal_outcome() {
    let faulty = engine_over(Fault::PanicOn(2)).await;
    let ids = drafts(&faulty, 3).await;
    assert_eq!(ids, vec![1, 2, 3]);
    let batch = BatchProcessor::new(faulty);

    let outcomes = batch.submit(&ids, "alice", None).await;
    assert_eq!(
      statuses(&outcomes),
      vec![OutcomeStatus::Success, OutcomeStatus::Internal, OutcomeStatus::Success]
    );

    // Unwinding released the panicking item's lock.
    let relocked = tokio::time::timeout(
      std::time::Duration::from_secs(1),
      batch.engine().locks().lock(2),
    )
    .await;
    assert!(relocked.is_ok());
  }
}
