//! Validated status transitions.
//!
//! A [`Transition`] can only be constructed for a legal step of the fixed
//! lifecycle, so everything downstream of [`Transition::new`] may assume the
//! `from`/`to`/`action` triple is consistent.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  document::{DocumentId, DocumentStatus, HistoryAction},
};

/// One legal step of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
  from:   DocumentStatus,
  to:     DocumentStatus,
  action: HistoryAction,
}

impl Transition {
  pub const SUBMIT: Self = Self {
    from:   DocumentStatus::Draft,
    to:     DocumentStatus::Submitted,
    action: HistoryAction::Submit,
  };

  pub const APPROVE: Self = Self {
    from:   DocumentStatus::Submitted,
    to:     DocumentStatus::Approved,
    action: HistoryAction::Approve,
  };

  /// Validate a requested transition.
  ///
  /// `from` must be the single predecessor of `to`, and `action` must be the
  /// action that produces `to`. Skipping a step, going backwards, or
  /// recording `CREATE` as a transition are all rejected.
  pub fn new(
    from: DocumentStatus,
    to: DocumentStatus,
    action: HistoryAction,
  ) -> Result<Self> {
    if to.predecessor() != Some(from) {
      return Err(Error::IllegalTransition {
        from,
        to,
        expected: to
          .predecessor()
          .map_or_else(|| "nowhere".to_owned(), |p| p.to_string()),
      });
    }
    if action.resulting_status() != to || action == HistoryAction::Create {
      return Err(Error::ActionMismatch { action, to });
    }
    Ok(Self { from, to, action })
  }

  pub fn from(&self) -> DocumentStatus { self.from }

  pub fn to(&self) -> DocumentStatus { self.to }

  pub fn action(&self) -> HistoryAction { self.action }

  /// Whether applying this transition must also write an approval record.
  pub fn creates_approval_record(&self) -> bool { self.to == DocumentStatus::Approved }
}

// ─── Direction ───────────────────────────────────────────────────────────────

/// Which of the two transitions a batch or drainer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Submit,
  Approve,
}

impl Direction {
  pub fn transition(self) -> Transition {
    match self {
      Self::Submit => Transition::SUBMIT,
      Self::Approve => Transition::APPROVE,
    }
  }
}

impl std::fmt::Display for Direction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::Submit => "submit",
      Self::Approve => "approve",
    })
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Everything a store needs to apply one transition to one document.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
  pub document_id: DocumentId,
  pub transition:  Transition,
  pub actor:       String,
  pub comment:     Option<String>,
}

impl TransitionRequest {
  pub fn new(
    document_id: DocumentId,
    transition: Transition,
    actor: impl Into<String>,
    comment: Option<String>,
  ) -> Self {
    Self { document_id, transition, actor: actor.into(), comment }
  }
}
