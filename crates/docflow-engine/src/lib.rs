//! Concurrency-safe transition engine for docflow documents.
//!
//! - [`TransitionEngine`] applies one validated transition to one document
//!   under that document's lock, as a single store transaction.
//! - [`BatchProcessor`] runs the engine over an ordered list of ids and
//!   always returns one outcome per id.
//! - [`QueueDrainer`] periodically claims queued documents (skipping any
//!   held by someone else) and advances them: submissions in one bulk
//!   update, approvals one full transition at a time.
//! - [`ContentionProbe`] hammers one document from many tasks and reports
//!   how the races resolved.
//!
//! The engine holds no process-wide state: locks and counters are owned by
//! whoever constructs them.

pub mod batch;
pub mod config;
pub mod drainer;
pub mod engine;
pub mod error;
pub mod locks;
pub mod probe;

pub use batch::BatchProcessor;
pub use config::{DrainerConfig, EngineConfig};
pub use drainer::{DrainReport, QueueDrainer};
pub use engine::TransitionEngine;
pub use error::{Error, Result};
pub use locks::DocumentLocks;
pub use probe::{ContentionProbe, ProbeReport};

#[cfg(test)]
mod testing;
