//! [`SqliteStore`], the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use chrono::Utc;
use docflow_core::{
  document::{ApprovalRecord, Document, DocumentId, DocumentStatus, HistoryAction, NewDocument},
  number,
  store::{Applied, DocumentStore},
  transition::TransitionRequest,
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{
  Result,
  encode::{
    APPROVAL_COLUMNS, DOCUMENT_COLUMNS, HISTORY_COLUMNS, RawApprovalRecord, RawDocument,
    RawHistoryEntry, encode_dt,
  },
  history::HistoryRecorder,
  schema::{BUSY_TIMEOUT, SCHEMA},
};

const CREATE_COMMENT: &str = "Document created in DRAFT";

/// Ids bound per `UPDATE` in a bulk advance, well under SQLite's
/// host-parameter limit.
pub(crate) const BULK_CHUNK: usize = 500;

/// What a transition transaction produced, before decoding.
enum RawApplied {
  Advanced(RawDocument),
  Missing,
  Mismatch(String),
  Rejected(String),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A docflow store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run arbitrary SQL against the store; used by tests to inject faults.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Read a document row and its history, oldest entry first.
fn load_document(
  conn: &rusqlite::Connection,
  id: DocumentId,
) -> rusqlite::Result<Option<RawDocument>> {
  let Some(mut raw) = conn
    .query_row(
      &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
      rusqlite::params![id],
      RawDocument::from_row,
    )
    .optional()?
  else {
    return Ok(None);
  };

  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {HISTORY_COLUMNS} FROM history WHERE document_id = ?1 ORDER BY id"
  ))?;
  raw.history = stmt
    .query_map(rusqlite::params![id], RawHistoryEntry::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(raw))
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = crate::Error;

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn create_document(&self, input: NewDocument) -> Result<Document> {
    let now = Utc::now();
    let number = number::document_number(now);
    let at_str = encode_dt(now);
    let status = DocumentStatus::Draft.as_ref().to_owned();

    let raw: RawDocument = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO documents (
             document_number, author, title, status, initiator, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![number, input.author, input.title, status, input.initiator, at_str],
        )?;
        let id = tx.last_insert_rowid();

        HistoryRecorder::new(&tx).record(
          id,
          HistoryAction::Create,
          &input.initiator,
          Some(CREATE_COMMENT),
          now,
        )?;

        let raw = load_document(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_document()
  }

  async fn get_document(&self, id: DocumentId) -> Result<Option<Document>> {
    let raw = self
      .conn
      .call(move |conn| Ok(load_document(conn, id)?))
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn get_documents(&self, ids: Vec<DocumentId>) -> Result<Vec<Document>> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
          if let Some(raw) = load_document(conn, id)? {
            found.push(raw);
          }
        }
        Ok(found)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn approval_records(&self, id: DocumentId) -> Result<Vec<ApprovalRecord>> {
    let raws: Vec<RawApprovalRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {APPROVAL_COLUMNS} FROM approval_registry WHERE document_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id], RawApprovalRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawApprovalRecord::into_record).collect()
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  async fn apply_transition(&self, request: TransitionRequest) -> Result<Applied> {
    let TransitionRequest { document_id: id, transition, actor, comment } = request;
    let now = Utc::now();
    let at_str = encode_dt(now);
    let from = transition.from().as_ref().to_owned();
    let to = transition.to().as_ref().to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock before the read, so no other
        // connection can interleave between the status check and the update.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<String> = tx
          .query_row(
            "SELECT status FROM documents WHERE id = ?1",
            rusqlite::params![id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(RawApplied::Missing);
        };
        if current != from {
          return Ok(RawApplied::Mismatch(current));
        }

        if transition.creates_approval_record() {
          let registry_number = number::registry_number(now);
          if let Err(e) = tx.execute(
            "INSERT INTO approval_registry (document_id, approved_by, approved_at, registry_number)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id, actor, at_str, registry_number],
          ) {
            return Ok(RawApplied::Rejected(e.to_string()));
          }
        }

        let updated = tx.execute(
          "UPDATE documents SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
          rusqlite::params![to, at_str, id, from],
        )?;
        if updated != 1 {
          return Ok(RawApplied::Mismatch(current));
        }

        HistoryRecorder::new(&tx).record(
          id,
          transition.action(),
          &actor,
          comment.as_deref(),
          now,
        )?;

        let raw = load_document(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(RawApplied::Advanced(raw))
      })
      .await?;

    Ok(match raw {
      RawApplied::Advanced(raw) => Applied::Advanced(raw.into_document()?),
      RawApplied::Missing => Applied::Missing,
      RawApplied::Mismatch(actual) => Applied::StatusMismatch {
        actual: DocumentStatus::parse(&actual)?,
      },
      RawApplied::Rejected(reason) => {
        tracing::warn!(document_id = id, %reason, "approval registry insert rejected; rolled back");
        Applied::RejectedByRegistry { reason }
      }
    })
  }

  // ── Queue primitives ──────────────────────────────────────────────────────

  async fn select_in_status(
    &self,
    status: DocumentStatus,
    limit: usize,
    offset: usize,
  ) -> Result<Vec<DocumentId>> {
    let status = status.as_ref().to_owned();
    let limit = limit as i64;
    let offset = offset as i64;

    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT id FROM documents WHERE status = ?1
           ORDER BY created_at, id
           LIMIT ?2 OFFSET ?3",
        )?;
        let ids = stmt
          .query_map(rusqlite::params![status, limit, offset], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<DocumentId>>>()?;
        Ok(ids)
      })
      .await?;

    Ok(ids)
  }

  async fn bulk_advance(
    &self,
    ids: Vec<DocumentId>,
    from: DocumentStatus,
    to: DocumentStatus,
  ) -> Result<usize> {
    if ids.is_empty() {
      return Ok(0);
    }

    let requested = ids.len();
    let (from_value, to_value) = (from.as_ref().to_owned(), to.as_ref().to_owned());
    let now = encode_dt(Utc::now());

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut updated = 0;
        for chunk in ids.chunks(BULK_CHUNK) {
          let placeholders = (0..chunk.len())
            .map(|i| format!("?{}", i + 4))
            .collect::<Vec<_>>()
            .join(", ");
          let sql = format!(
            "UPDATE documents SET status = ?1, updated_at = ?2
             WHERE status = ?3 AND id IN ({placeholders})"
          );

          let mut values: Vec<rusqlite::types::Value> =
            vec![to_value.clone().into(), now.clone().into(), from_value.clone().into()];
          values.extend(chunk.iter().map(|&id| rusqlite::types::Value::from(id)));
          updated += tx.execute(&sql, rusqlite::params_from_iter(values))?;
        }
        tx.commit()?;
        Ok(updated)
      })
      .await?;

    tracing::debug!(%from, %to, requested, updated, "bulk status update");
    Ok(updated)
  }

  async fn count_in_status(&self, status: DocumentStatus) -> Result<u64> {
    let status = status.as_ref().to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM documents WHERE status = ?1",
          rusqlite::params![status],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }
}
