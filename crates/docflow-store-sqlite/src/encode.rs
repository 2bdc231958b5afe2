//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width,
//! so lexical order in SQL matches chronological order. Statuses and actions
//! are stored as their SCREAMING_SNAKE_CASE discriminants.

use chrono::{DateTime, SecondsFormat, Utc};
use docflow_core::document::{
  ApprovalRecord, Document, DocumentStatus, HistoryAction, HistoryEntry,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub const DOCUMENT_COLUMNS: &str =
  "id, document_number, author, title, status, initiator, created_at, updated_at";

pub const HISTORY_COLUMNS: &str = "id, document_id, initiator, timestamp, action, comment";

pub const APPROVAL_COLUMNS: &str =
  "id, document_id, approved_by, approved_at, registry_number";

/// A `documents` row plus its `history` rows, exactly as read from SQLite.
#[derive(Debug)]
pub struct RawDocument {
  pub id:              i64,
  pub document_number: String,
  pub author:          String,
  pub title:           String,
  pub status:          String,
  pub initiator:       String,
  pub created_at:      String,
  pub updated_at:      String,
  pub history:         Vec<RawHistoryEntry>,
}

impl RawDocument {
  /// Read the columns listed in [`DOCUMENT_COLUMNS`]; history is filled later.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      document_number: row.get(1)?,
      author:          row.get(2)?,
      title:           row.get(3)?,
      status:          row.get(4)?,
      initiator:       row.get(5)?,
      created_at:      row.get(6)?,
      updated_at:      row.get(7)?,
      history:         Vec::new(),
    })
  }

  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      id:              self.id,
      document_number: self.document_number,
      author:          self.author,
      title:           self.title,
      status:          DocumentStatus::parse(&self.status)?,
      initiator:       self.initiator,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
      history:         self
        .history
        .into_iter()
        .map(RawHistoryEntry::into_entry)
        .collect::<Result<_>>()?,
    })
  }
}

#[derive(Debug)]
pub struct RawHistoryEntry {
  pub id:          i64,
  pub document_id: i64,
  pub initiator:   String,
  pub timestamp:   String,
  pub action:      String,
  pub comment:     String,
}

impl RawHistoryEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      document_id: row.get(1)?,
      initiator:   row.get(2)?,
      timestamp:   row.get(3)?,
      action:      row.get(4)?,
      comment:     row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      id:          self.id,
      document_id: self.document_id,
      initiator:   self.initiator,
      timestamp:   decode_dt(&self.timestamp)?,
      action:      HistoryAction::parse(&self.action)?,
      comment:     self.comment,
    })
  }
}

#[derive(Debug)]
pub struct RawApprovalRecord {
  pub id:              i64,
  pub document_id:     i64,
  pub approved_by:     String,
  pub approved_at:     String,
  pub registry_number: String,
}

impl RawApprovalRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      document_id:     row.get(1)?,
      approved_by:     row.get(2)?,
      approved_at:     row.get(3)?,
      registry_number: row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<ApprovalRecord> {
    Ok(ApprovalRecord {
      id:              self.id,
      document_id:     self.document_id,
      approved_by:     self.approved_by,
      approved_at:     decode_dt(&self.approved_at)?,
      registry_number: self.registry_number,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_lexically() {
    let early = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let late = early + chrono::Duration::microseconds(1_500);
    let (a, b) = (encode_dt(early), encode_dt(late));
    assert_eq!(a.len(), b.len());
    assert!(a < b, "{a} !< {b}");
    assert_eq!(decode_dt(&b).unwrap(), late);
  }

  #[test]
  fn garbage_timestamp_is_a_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
