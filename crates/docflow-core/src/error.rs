//! Error types for `docflow-core`.

use thiserror::Error;

use crate::document::{DocumentStatus, HistoryAction};

#[derive(Debug, Error)]
pub enum Error {
  #[error("illegal transition {from} -> {to}: {to} may only be reached from {expected}")]
  IllegalTransition {
    from:     DocumentStatus,
    to:       DocumentStatus,
    expected: String,
  },

  #[error("action {action} does not produce status {to}")]
  ActionMismatch {
    action: HistoryAction,
    to:     DocumentStatus,
  },

  #[error("unknown document status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown history action: {0:?}")]
  UnknownAction(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
