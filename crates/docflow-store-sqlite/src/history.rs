//! The history recorder: the only writer of the `history` table.

use chrono::{DateTime, Utc};
use docflow_core::document::{DocumentId, HistoryAction};

use crate::encode::{RawHistoryEntry, encode_dt};

/// Appends audit entries through the connection of an already-open
/// transaction, so a failed append fails the surrounding unit.
///
/// Never reads or writes `documents.status`.
pub struct HistoryRecorder<'c> {
  conn: &'c rusqlite::Connection,
}

impl<'c> HistoryRecorder<'c> {
  /// `conn` must be a transaction (`rusqlite::Transaction` derefs to it).
  pub fn new(conn: &'c rusqlite::Connection) -> Self { Self { conn } }

  pub fn record(
    &self,
    document_id: DocumentId,
    action: HistoryAction,
    actor: &str,
    comment: Option<&str>,
    at: DateTime<Utc>,
  ) -> rusqlite::Result<RawHistoryEntry> {
    let timestamp = encode_dt(at);
    let comment = comment.unwrap_or_default();

    self.conn.execute(
      "INSERT INTO history (document_id, initiator, timestamp, action, comment)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![document_id, actor, timestamp, action.as_ref(), comment],
    )?;

    Ok(RawHistoryEntry {
      id:          self.conn.last_insert_rowid(),
      document_id,
      initiator:   actor.to_owned(),
      timestamp,
      action:      action.as_ref().to_owned(),
      comment:     comment.to_owned(),
    })
  }
}
