//! Shared fixtures for engine tests.

use std::{sync::Arc, time::Duration};

use docflow_core::{
  document::{ApprovalRecord, Document, DocumentId, DocumentStatus, NewDocument},
  store::{Applied, DocumentStore},
  transition::TransitionRequest,
};
use docflow_store_sqlite::SqliteStore;

use crate::{EngineConfig, TransitionEngine};

pub async fn engine() -> TransitionEngine<SqliteStore> {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  TransitionEngine::new(Arc::new(store), &EngineConfig::default())
}

pub async fn engine_over(fault: Fault) -> TransitionEngine<FaultyStore> {
  TransitionEngine::new(Arc::new(FaultyStore::new(fault).await), &EngineConfig::default())
}

/// Create `n` drafts and return their ids, oldest first.
pub async fn drafts<S: DocumentStore>(engine: &TransitionEngine<S>, n: usize) -> Vec<DocumentId> {
  let mut ids = Vec::with_capacity(n);
  for i in 0..n {
    let doc = engine
      .store()
      .create_document(NewDocument::new("Author", format!("Document {i}"), "alice"))
      .await
      .expect("create document");
    ids.push(doc.id);
  }
  ids
}

// ─── Fault injection ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Fault {
  /// Approvals report a rejected registry insert.
  RejectRegistry,
  /// Every transition fails with a store error.
  Fail,
  /// Every transition sleeps before reaching the store.
  Stall(Duration),
  /// Transitions on this document panic.
  PanicOn(DocumentId),
  /// Transitions work; queue counts fail.
  FailCount,
}

#[derive(Debug, thiserror::Error)]
pub enum FaultError {
  #[error(transparent)]
  Inner(#[from] docflow_store_sqlite::Error),

  #[error("injected store fault")]
  Injected,
}

/// A [`SqliteStore`] whose transitions misbehave according to a [`Fault`].
pub struct FaultyStore {
  inner: SqliteStore,
  fault: Fault,
}

impl FaultyStore {
  pub async fn new(fault: Fault) -> Self {
    Self {
      inner: SqliteStore::open_in_memory().await.expect("in-memory store"),
      fault,
    }
  }
}

impl DocumentStore for FaultyStore {
  type Error = FaultError;

  async fn create_document(&self, input: NewDocument) -> Result<Document, FaultError> {
    Ok(self.inner.create_document(input).await?)
  }

  async fn get_document(&self, id: DocumentId) -> Result<Option<Document>, FaultError> {
    Ok(self.inner.get_document(id).await?)
  }

  async fn get_documents(&self, ids: Vec<DocumentId>) -> Result<Vec<Document>, FaultError> {
    Ok(self.inner.get_documents(ids).await?)
  }

  async fn approval_records(&self, id: DocumentId) -> Result<Vec<ApprovalRecord>, FaultError> {
    Ok(self.inner.approval_records(id).await?)
  }

  async fn apply_transition(&self, request: TransitionRequest) -> Result<Applied, FaultError> {
    match self.fault {
      Fault::RejectRegistry if request.transition.creates_approval_record() => {
        Ok(Applied::RejectedByRegistry {
          reason: "registry unavailable".to_owned(),
        })
      }
      Fault::RejectRegistry => Ok(self.inner.apply_transition(request).await?),
      Fault::Fail => Err(FaultError::Injected),
      Fault::PanicOn(id) if request.document_id == id => {
        panic!("injected panic for document {id}")
      }
      Fault::PanicOn(_) | Fault::FailCount => Ok(self.inner.apply_transition(request).await?),
      Fault::Stall(delay) => {
        tokio::time::sleep(delay).await;
        Ok(self.inner.apply_transition(request).await?)
      }
    }
  }

  async fn select_in_status(
    &self,
    status: DocumentStatus,
    limit: usize,
    offset: usize,
  ) -> Result<Vec<DocumentId>, FaultError> {
    Ok(self.inner.select_in_status(status, limit, offset).await?)
  }

  async fn bulk_advance(
    &self,
    ids: Vec<DocumentId>,
    from: DocumentStatus,
    to: DocumentStatus,
  ) -> Result<usize, FaultError> {
    Ok(self.inner.bulk_advance(ids, from, to).await?)
  }

  async fn count_in_status(&self, status: DocumentStatus) -> Result<u64, FaultError> {
    if matches!(self.fault, Fault::FailCount) {
      return Err(FaultError::Injected);
    }
    Ok(self.inner.count_in_status(status).await?)
  }
}
