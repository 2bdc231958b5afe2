//! The per-document lock table.
//!
//! Every document id gets its own async mutex, created on first use and
//! forgotten once nobody holds or waits on it. Holding a document's mutex is
//! what "owning" the document means inside this process: the engine holds it
//! for one transition, a drainer holds it for a whole tick.
//!
//! Locks never cover more than one document, so a claim over some rows
//! never delays work on any other row.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex as StdMutex, PoisonError, Weak},
};

use docflow_core::document::DocumentId;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub type DocumentGuard = OwnedMutexGuard<()>;

/// Dead entries are swept once the table grows past this many.
const MIN_PRUNE_THRESHOLD: usize = 1024;

struct Table {
  entries:  HashMap<DocumentId, Weak<Mutex<()>>>,
  prune_at: usize,
}

pub struct DocumentLocks {
  table: StdMutex<Table>,
}

impl DocumentLocks {
  pub fn new() -> Self {
    Self {
      table: StdMutex::new(Table {
        entries:  HashMap::new(),
        prune_at: MIN_PRUNE_THRESHOLD,
      }),
    }
  }

  /// The live mutex for `id`, or a fresh one if nobody holds or awaits it.
  ///
  /// Guards and pending `lock_owned` futures keep a strong reference, so a
  /// mutex is only replaced once it can no longer be contended.
  fn mutex_for(&self, id: DocumentId) -> Arc<Mutex<()>> {
    let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(mutex) = table.entries.get(&id).and_then(Weak::upgrade) {
      return mutex;
    }

    if table.entries.len() >= table.prune_at {
      table.entries.retain(|_, weak| weak.strong_count() > 0);
      table.prune_at = (table.entries.len() * 2).max(MIN_PRUNE_THRESHOLD);
    }

    let mutex = Arc::new(Mutex::new(()));
    table.entries.insert(id, Arc::downgrade(&mutex));
    mutex
  }

  /// Entries currently tracked, live or not yet swept.
  pub fn tracked(&self) -> usize {
    self.table.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
  }

  /// Wait until `id` is free and take it.
  pub async fn lock(&self, id: DocumentId) -> DocumentGuard {
    self.mutex_for(id).lock_owned().await
  }

  /// Add `id` to `claim` if nobody else holds it. Never waits; returns
  /// `false` when the document is held elsewhere. Claiming an id twice is a
  /// no-op that returns `true`.
  pub fn try_claim(&self, claim: &mut Claim, id: DocumentId) -> bool {
    if claim.guards.contains_key(&id) {
      return true;
    }
    match self.mutex_for(id).try_lock_owned() {
      Ok(guard) => {
        claim.guards.insert(id, guard);
        claim.ids.push(id);
        true
      }
      Err(_) => false,
    }
  }
}

impl Default for DocumentLocks {
  fn default() -> Self { Self::new() }
}

/// A set of documents claimed together. Dropping it releases every one.
#[derive(Default)]
pub struct Claim {
  guards: HashMap<DocumentId, DocumentGuard>,
  ids:    Vec<DocumentId>,
}

impl Claim {
  /// Claimed ids, in claim order.
  pub fn ids(&self) -> &[DocumentId] { &self.ids }

  pub fn len(&self) -> usize { self.ids.len() }

  pub fn is_empty(&self) -> bool { self.ids.is_empty() }

  pub fn contains(&self, id: DocumentId) -> bool { self.guards.contains_key(&id) }
}
