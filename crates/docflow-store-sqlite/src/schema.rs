//! SQL schema for the docflow SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

use std::time::Duration;

/// How long a writer waits on SQLite's file lock before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS documents (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    document_number TEXT NOT NULL UNIQUE,
    author          TEXT NOT NULL,
    title           TEXT NOT NULL,
    status          TEXT NOT NULL,   -- 'DRAFT' | 'SUBMITTED' | 'APPROVED'
    initiator       TEXT NOT NULL,
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC, fixed microsecond width
    updated_at      TEXT NOT NULL
);

-- Append-only audit trail. No UPDATE is ever issued against this table.
CREATE TABLE IF NOT EXISTS history (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    initiator   TEXT NOT NULL,
    timestamp   TEXT NOT NULL,
    action      TEXT NOT NULL,       -- 'CREATE' | 'SUBMIT' | 'APPROVE'
    comment     TEXT NOT NULL DEFAULT ''
);

-- Written once per approved document, never updated.
CREATE TABLE IF NOT EXISTS approval_registry (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id     INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    approved_by     TEXT NOT NULL,
    approved_at     TEXT NOT NULL,
    registry_number TEXT NOT NULL UNIQUE,
    UNIQUE (document_id)
);

CREATE INDEX IF NOT EXISTS documents_queue_idx ON documents(status, created_at, id);
CREATE INDEX IF NOT EXISTS history_document_idx ON history(document_id);

PRAGMA user_version = 1;
";
