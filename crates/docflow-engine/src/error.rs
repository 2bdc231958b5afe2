//! Error type for `docflow-engine`.
//!
//! Transition attempts never fail with this type; they report an
//! [`Outcome`](docflow_core::outcome::Outcome). These errors cover the
//! surrounding machinery: drainer selection and probe setup.

use docflow_core::document::{DocumentId, DocumentStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("document not found: {0}")]
  DocumentNotFound(DocumentId),

  #[error("document {id} is {actual}; the probe needs a SUBMITTED document")]
  NotSubmitted {
    id:     DocumentId,
    actual: DocumentStatus,
  },
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
