//! Documents, their audit history, and approval registry records.
//!
//! A document only ever moves forward through
//! [`DocumentStatus::Draft`] → [`DocumentStatus::Submitted`] →
//! [`DocumentStatus::Approved`]. Every accepted move appends a
//! [`HistoryEntry`]; reaching `Approved` additionally creates exactly one
//! [`ApprovalRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// Store-assigned document identifier.
pub type DocumentId = i64;

// ─── Status ──────────────────────────────────────────────────────────────────

/// The lifecycle position of a document.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
  Draft,
  Submitted,
  Approved,
}

impl DocumentStatus {
  /// The status this one may advance to, if any.
  pub fn successor(self) -> Option<Self> {
    match self {
      Self::Draft => Some(Self::Submitted),
      Self::Submitted => Some(Self::Approved),
      Self::Approved => None,
    }
  }

  /// The single status from which this one may be reached.
  pub fn predecessor(self) -> Option<Self> {
    match self {
      Self::Draft => None,
      Self::Submitted => Some(Self::Draft),
      Self::Approved => Some(Self::Submitted),
    }
  }

  /// Parse the stored discriminant (`"DRAFT"`, `"SUBMITTED"`, `"APPROVED"`).
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// The audited action recorded in a [`HistoryEntry`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
  Create,
  Submit,
  Approve,
}

impl HistoryAction {
  /// The status a document holds once this action has been applied.
  pub fn resulting_status(self) -> DocumentStatus {
    match self {
      Self::Create => DocumentStatus::Draft,
      Self::Submit => DocumentStatus::Submitted,
      Self::Approve => DocumentStatus::Approved,
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownAction(s.to_owned()))
  }
}

/// One immutable line of a document's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub id:          i64,
  pub document_id: DocumentId,
  pub initiator:   String,
  pub timestamp:   DateTime<Utc>,
  pub action:      HistoryAction,
  /// Empty when the caller supplied no comment.
  pub comment:     String,
}

// ─── Document ────────────────────────────────────────────────────────────────

/// A document together with its full, chronologically ordered history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub id:              DocumentId,
  /// Human-readable number, e.g. `DOC-20240131-9F2C4A1B`.
  pub document_number: String,
  pub author:          String,
  pub title:           String,
  pub initiator:       String,
  pub status:          DocumentStatus,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  #[serde(default)]
  pub history:         Vec<HistoryEntry>,
}

/// Input for creating a document. New documents always start in
/// [`DocumentStatus::Draft`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
  pub author:    String,
  pub title:     String,
  pub initiator: String,
}

impl NewDocument {
  pub fn new(
    author: impl Into<String>,
    title: impl Into<String>,
    initiator: impl Into<String>,
  ) -> Self {
    Self {
      author:    author.into(),
      title:     title.into(),
      initiator: initiator.into(),
    }
  }
}

// ─── Approval registry ───────────────────────────────────────────────────────

/// The registry row written exactly once, when a document is approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
  pub id:              i64,
  pub document_id:     DocumentId,
  pub approved_by:     String,
  pub approved_at:     DateTime<Utc>,
  /// e.g. `REG-20240131-04D1E77A`.
  pub registry_number: String,
}
