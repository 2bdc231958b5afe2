//! Timer-driven queue draining.
//!
//! Each tick claims up to `batch_size` documents in the source status,
//! oldest first, skipping any whose lock is held elsewhere (a foreground
//! transition or another drainer), and advances the claimed set while
//! holding the claim.
//!
//! The two queues deliberately use different paths:
//!
//! - **submit**: one bulk `UPDATE` over the claimed ids. No history entries
//!   are written; a `DRAFT → SUBMITTED` move carries no other obligation.
//! - **approve**: every claimed document goes through the full transition
//!   engine, because an approval without its registry record would break the
//!   registry invariant. Slower, never bulk.

use std::{sync::Arc, time::Duration, time::Instant};

use docflow_core::{
  document::DocumentStatus,
  store::DocumentStore,
  transition::{Direction, Transition, TransitionRequest},
};
use serde::Serialize;
use tokio::{sync::watch, time::MissedTickBehavior};

use crate::{
  Error, Result,
  config::DrainerConfig,
  engine::TransitionEngine,
  locks::Claim,
};

/// Identity recorded on approvals performed by the drainer.
pub const WORKER_ACTOR: &str = "SYSTEM-WORKER";

const APPROVE_COMMENT: &str = "Automatic approval";

/// How many `batch_size` pages a tick scans looking for unlocked rows.
const MAX_SCAN_PAGES: usize = 4;

/// The result of one drain tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrainReport {
  pub direction: Direction,
  /// Documents held by this tick.
  pub claimed:   usize,
  /// Documents actually moved to the destination status.
  pub advanced:  usize,
}

impl DrainReport {
  fn idle(direction: Direction) -> Self { Self { direction, claimed: 0, advanced: 0 } }
}

pub struct QueueDrainer<S> {
  engine: TransitionEngine<S>,
  config: DrainerConfig,
}

impl<S> QueueDrainer<S>
where
  S: DocumentStore + 'static,
{
  /// The drainer shares `engine`'s lock table, which is what keeps its
  /// claims and foreground transitions mutually exclusive.
  pub fn new(engine: TransitionEngine<S>, config: DrainerConfig) -> Self {
    Self { engine, config }
  }

  pub fn config(&self) -> &DrainerConfig { &self.config }

  pub async fn drain_submit_queue(&self) -> Result<DrainReport> {
    self.drain(Direction::Submit).await
  }

  pub async fn drain_approve_queue(&self) -> Result<DrainReport> {
    self.drain(Direction::Approve).await
  }

  /// Run one tick for `direction`. A disabled queue or an empty selection is
  /// a no-op reporting zero.
  pub async fn drain(&self, direction: Direction) -> Result<DrainReport> {
    let enabled = match direction {
      Direction::Submit => self.config.submit_enabled,
      Direction::Approve => self.config.approve_enabled,
    };
    if !enabled {
      tracing::debug!(%direction, "queue drainer disabled");
      return Ok(DrainReport::idle(direction));
    }

    let started = Instant::now();
    let transition = direction.transition();
    let claim = self.claim(transition.from()).await?;
    if claim.is_empty() {
      tracing::debug!(%direction, "queue empty");
      return Ok(DrainReport::idle(direction));
    }

    let claimed = claim.len();
    let advanced = match direction {
      Direction::Submit => self
        .engine
        .store()
        .bulk_advance(claim.ids().to_vec(), transition.from(), transition.to())
        .await
        .map_err(Error::store)?,
      Direction::Approve => self.approve_claimed(&claim, transition).await,
    };
    drop(claim);

    // The tick already committed; a failed count only costs the log field.
    let remaining = match self.engine.store().count_in_status(transition.from()).await {
      Ok(remaining) => Some(remaining),
      Err(e) => {
        tracing::warn!(%direction, error = %e, "could not count remaining queue");
        None
      }
    };

    tracing::info!(
      %direction,
      claimed,
      advanced,
      remaining = ?remaining,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "queue drain tick finished"
    );

    Ok(DrainReport { direction, claimed, advanced })
  }

  async fn approve_claimed(&self, claim: &Claim, transition: Transition) -> usize {
    let mut approved = 0;
    for &id in claim.ids() {
      let request = TransitionRequest::new(
        id,
        transition,
        WORKER_ACTOR,
        Some(APPROVE_COMMENT.to_owned()),
      );
      if self.engine.apply_held(request).await.is_success() {
        approved += 1;
      }
    }
    approved
  }

  /// Skip-locked selection: page through `status` oldest first and keep
  /// every candidate whose lock can be taken without waiting.
  async fn claim(&self, status: DocumentStatus) -> Result<Claim> {
    let batch_size = self.config.batch_size;
    let locks = self.engine.locks();
    let mut claim = Claim::default();
    if batch_size == 0 {
      return Ok(claim);
    }

    for page in 0..MAX_SCAN_PAGES {
      let candidates = self
        .engine
        .store()
        .select_in_status(status, batch_size, page * batch_size)
        .await
        .map_err(Error::store)?;

      for &id in &candidates {
        if claim.len() == batch_size {
          break;
        }
        if !claim.contains(id) {
          locks.try_claim(&mut claim, id);
        }
      }

      if claim.len() == batch_size || candidates.len() < batch_size {
        break;
      }
    }

    Ok(claim)
  }

  /// Drain `direction` every configured interval until `shutdown` turns
  /// `true` or its sender is dropped. A failed tick is logged and the loop
  /// continues.
  pub async fn run(self: Arc<Self>, direction: Direction, mut shutdown: watch::Receiver<bool>) {
    let period = Duration::from_millis(
      match direction {
        Direction::Submit => self.config.submit_interval_ms,
        Direction::Approve => self.config.approve_interval_ms,
      }
      .max(1),
    );
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(%direction, period_ms = period.as_millis() as u64, "queue drainer started");
    loop {
      tokio::select! {
        _ = ticker.tick() => {
          if let Err(e) = self.drain(direction).await {
            tracing::error!(%direction, error = %e, "queue drain tick failed");
          }
        }
        changed = shutdown.changed() => {
          if changed.is_err() || *shutdown.borrow() {
            break;
          }
        }
      }
    }
    tracing::info!(%direction, "queue drainer stopped");
  }
}
