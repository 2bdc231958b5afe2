//! The `DocumentStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `docflow-store-sqlite`).
//! The engine and HTTP layers depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::{
  document::{ApprovalRecord, Document, DocumentId, DocumentStatus, NewDocument},
  transition::TransitionRequest,
};

/// What happened inside one [`DocumentStore::apply_transition`] unit.
///
/// Every variant other than `Advanced` means the unit rolled back and left no
/// trace in the store.
#[derive(Debug, Clone)]
pub enum Applied {
  /// Status written, history appended, approval record created if required.
  Advanced(Document),
  Missing,
  /// The document was not in the transition's `from` status.
  StatusMismatch { actual: DocumentStatus },
  /// Writing the approval record failed.
  RejectedByRegistry { reason: String },
}

/// Abstraction over a transactional document store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Persist a new `DRAFT` document with a freshly generated number and its
  /// `CREATE` history entry, atomically.
  fn create_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  /// Retrieve a document and its history. Returns `None` if not found.
  fn get_document(
    &self,
    id: DocumentId,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Retrieve every document in `ids` that exists, in input order.
  fn get_documents(
    &self,
    ids: Vec<DocumentId>,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  /// All approval records referencing `id`. Never more than one if the
  /// store upholds its contract.
  fn approval_records(
    &self,
    id: DocumentId,
  ) -> impl Future<Output = Result<Vec<ApprovalRecord>, Self::Error>> + Send + '_;

  // ── Transitions ───────────────────────────────────────────────────────

  /// Apply one transition as a single atomic unit.
  ///
  /// Implementations must read the current status under exclusivity (row
  /// lock, single-writer transaction, or compare-and-set on the status), so
  /// that two concurrent requests for the same document can never both
  /// observe `from` and both advance. When the transition targets
  /// `APPROVED`, the approval record is written in the same unit as the
  /// status change and the history entry; if any of the three fails, none of
  /// them survive.
  fn apply_transition(
    &self,
    request: TransitionRequest,
  ) -> impl Future<Output = Result<Applied, Self::Error>> + Send + '_;

  // ── Queue primitives ──────────────────────────────────────────────────

  /// IDs of documents in `status`, oldest first (`created_at`, then id).
  fn select_in_status(
    &self,
    status: DocumentStatus,
    limit: usize,
    offset: usize,
  ) -> impl Future<Output = Result<Vec<DocumentId>, Self::Error>> + Send + '_;

  /// Move every document in `ids` that is still in `from` to `to`, in one
  /// atomic statement. Writes no history and no approval records. Returns
  /// the number of rows actually updated.
  fn bulk_advance(
    &self,
    ids: Vec<DocumentId>,
    from: DocumentStatus,
    to: DocumentStatus,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn count_in_status(
    &self,
    status: DocumentStatus,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
