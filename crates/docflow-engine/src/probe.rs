//! A contention probe: many tasks racing to approve one document.

use std::{
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Instant,
};

use docflow_core::{
  document::{DocumentId, DocumentStatus},
  outcome::OutcomeStatus,
  store::DocumentStore,
};
use serde::Serialize;
use tokio::sync::Barrier;

use crate::{Error, Result, batch::BatchProcessor};

const PROBE_ACTOR: &str = "probe";
const PROBE_COMMENT: &str = "contention probe";

/// How one probe run resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
  pub document_id:         DocumentId,
  pub successful_attempts: usize,
  pub conflict_attempts:   usize,
  /// Every outcome that is neither a success nor a conflict.
  pub error_attempts:      usize,
  pub final_status:        DocumentStatus,
  /// Approval records referencing the document after the run. Exactly one
  /// when the engine is sound.
  pub registry_records:    usize,
  pub elapsed_ms:          u64,
}

#[derive(Default)]
struct Counters {
  success:  AtomicUsize,
  conflict: AtomicUsize,
  error:    AtomicUsize,
}

impl Counters {
  fn record(&self, status: OutcomeStatus) {
    let counter = match status {
      OutcomeStatus::Success => &self.success,
      OutcomeStatus::Conflict => &self.conflict,
      _ => &self.error,
    };
    counter.fetch_add(1, Ordering::Relaxed);
  }
}

pub struct ContentionProbe<S> {
  batch: BatchProcessor<S>,
}

impl<S> ContentionProbe<S>
where
  S: DocumentStore + 'static,
{
  pub fn new(batch: BatchProcessor<S>) -> Self { Self { batch } }

  /// Release `threads` tasks at once, each approving `document_id`
  /// `attempts` times through the batch path.
  ///
  /// The document must be `SUBMITTED`. The probe never rewinds a document's
  /// status, so each document can be probed once.
  pub async fn run(
    &self,
    document_id: DocumentId,
    threads: usize,
    attempts: usize,
  ) -> Result<ProbeReport> {
    let store = self.batch.engine().store();
    let doc = store
      .get_document(document_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::DocumentNotFound(document_id))?;
    if doc.status != DocumentStatus::Submitted {
      return Err(Error::NotSubmitted { id: document_id, actual: doc.status });
    }

    tracing::info!(document_id, threads, attempts, "contention probe started");
    let started = Instant::now();
    let counters = Arc::new(Counters::default());
    let barrier = Arc::new(Barrier::new(threads));

    let tasks: Vec<_> = (0..threads)
      .map(|_| {
        let batch = self.batch.clone();
        let counters = counters.clone();
        let barrier = barrier.clone();
        tokio::spawn(async move {
          barrier.wait().await;
          for _ in 0..attempts {
            for outcome in batch.approve(&[document_id], PROBE_ACTOR, Some(PROBE_COMMENT)).await {
              counters.record(outcome.status);
            }
          }
        })
      })
      .collect();

    for task in tasks {
      if let Err(e) = task.await {
        tracing::error!(document_id, error = %e, "probe task aborted");
        counters.error.fetch_add(attempts, Ordering::Relaxed);
      }
    }

    let final_status = store
      .get_document(document_id)
      .await
      .map_err(Error::store)?
      .map_or(doc.status, |d| d.status);
    let registry_records = store
      .approval_records(document_id)
      .await
      .map_err(Error::store)?
      .len();

    let report = ProbeReport {
      document_id,
      successful_attempts: counters.success.load(Ordering::Relaxed),
      conflict_attempts: counters.conflict.load(Ordering::Relaxed),
      error_attempts: counters.error.load(Ordering::Relaxed),
      final_status,
      registry_records,
      elapsed_ms: started.elapsed().as_millis() as u64,
    };
    tracing::info!(
      document_id,
      success = report.successful_attempts,
      conflict = report.conflict_attempts,
      error = report.error_attempts,
      final_status = %report.final_status,
      registry_records,
      "contention probe finished"
    );

    Ok(report)
  }
}
