//! SQLite backend for the docflow document store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every transition is one
//! `BEGIN IMMEDIATE` transaction, which makes SQLite the single writer for
//! the duration of the read-check-write sequence.

mod encode;
mod history;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
