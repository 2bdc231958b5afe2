//! Per-document results of a transition attempt.

use serde::{Deserialize, Serialize};

use crate::{
  document::{Document, DocumentId, DocumentStatus},
  transition::Transition,
};

/// The outcome taxonomy reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
  Success,
  /// The document was not in the required status; includes lost races.
  Conflict,
  NotFound,
  /// The approval record could not be written; the transition rolled back.
  RegistryError,
  /// Store fault, timeout, or an invalid request.
  Internal,
}

/// The result of one transition attempt on one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
  pub id:       DocumentId,
  pub status:   OutcomeStatus,
  pub message:  String,
  /// Snapshot after a successful transition.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub document: Option<Document>,
}

impl Outcome {
  pub fn success(document: Document, transition: Transition) -> Self {
    Self {
      id:       document.id,
      status:   OutcomeStatus::Success,
      message:  format!("document moved to {}", transition.to()),
      document: Some(document),
    }
  }

  pub fn conflict(id: DocumentId, actual: DocumentStatus, expected: DocumentStatus) -> Self {
    Self::bare(
      id,
      OutcomeStatus::Conflict,
      format!("document is {actual}, expected {expected}"),
    )
  }

  pub fn not_found(id: DocumentId) -> Self {
    Self::bare(id, OutcomeStatus::NotFound, format!("document {id} not found"))
  }

  pub fn registry_error(id: DocumentId, reason: impl std::fmt::Display) -> Self {
    Self::bare(
      id,
      OutcomeStatus::RegistryError,
      format!("could not create approval record: {reason}"),
    )
  }

  pub fn internal(id: DocumentId, reason: impl std::fmt::Display) -> Self {
    Self::bare(id, OutcomeStatus::Internal, format!("internal error: {reason}"))
  }

  fn bare(id: DocumentId, status: OutcomeStatus, message: String) -> Self {
    Self { id, status, message, document: None }
  }

  pub fn is_success(&self) -> bool { self.status == OutcomeStatus::Success }
}

// ─── Tally ───────────────────────────────────────────────────────────────────

/// Per-status counts over a set of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
  pub success:        usize,
  pub conflict:       usize,
  pub not_found:      usize,
  pub registry_error: usize,
  pub internal:       usize,
}

impl OutcomeTally {
  pub fn add(&mut self, status: OutcomeStatus) {
    match status {
      OutcomeStatus::Success => self.success += 1,
      OutcomeStatus::Conflict => self.conflict += 1,
      OutcomeStatus::NotFound => self.not_found += 1,
      OutcomeStatus::RegistryError => self.registry_error += 1,
      OutcomeStatus::Internal => self.internal += 1,
    }
  }

  pub fn total(&self) -> usize {
    self.success + self.conflict + self.not_found + self.registry_error + self.internal
  }
}

impl<'a> FromIterator<&'a Outcome> for OutcomeTally {
  fn from_iter<I: IntoIterator<Item = &'a Outcome>>(iter: I) -> Self {
    let mut tally = Self::default();
    for outcome in iter {
      tally.add(outcome.status);
    }
    tally
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn conflict_message_names_actual_status() {
    let outcome = Outcome::conflict(7, DocumentStatus::Approved, DocumentStatus::Draft);
    assert_eq!(outcome.status, OutcomeStatus::Conflict);
    assert!(outcome.message.contains("APPROVED"), "{}", outcome.message);
    assert!(outcome.document.is_none());
  }

  #[test]
  fn status_serialises_screaming() {
    let json = serde_json::to_string(&OutcomeStatus::RegistryError).unwrap();
    assert_eq!(json, "\"REGISTRY_ERROR\"");
  }

  #[test]
  fn tally_counts_each_status() {
    let outcomes = [
      Outcome::not_found(1),
      Outcome::conflict(2, DocumentStatus::Draft, DocumentStatus::Submitted),
      Outcome::conflict(3, DocumentStatus::Draft, DocumentStatus::Submitted),
      Outcome::internal(4, "boom"),
    ];
    let tally: OutcomeTally = outcomes.iter().collect();
    assert_eq!(tally.conflict, 2);
    assert_eq!(tally.not_found, 1);
    assert_eq!(tally.internal, 1);
    assert_eq!(tally.success, 0);
    assert_eq!(tally.total(), 4);
  }
}
