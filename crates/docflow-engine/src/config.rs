//! Engine and drainer settings, deserialised from the server config.

use std::time::Duration;

use serde::Deserialize;

/// Settings for [`TransitionEngine`](crate::TransitionEngine).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Upper bound on one transition, from waiting for the document's lock to
  /// the end of its store transaction. Exceeding it is reported as an
  /// internal failure, never as a conflict.
  pub transaction_timeout_ms: u64,
}

impl EngineConfig {
  pub fn transaction_timeout(&self) -> Duration {
    Duration::from_millis(self.transaction_timeout_ms)
  }
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      transaction_timeout_ms: 5_000,
    }
  }
}

/// Settings for [`QueueDrainer`](crate::QueueDrainer).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DrainerConfig {
  /// Maximum documents claimed per tick.
  pub batch_size:          usize,
  pub submit_enabled:      bool,
  pub approve_enabled:     bool,
  pub submit_interval_ms:  u64,
  pub approve_interval_ms: u64,
}

impl Default for DrainerConfig {
  fn default() -> Self {
    Self {
      batch_size:          100,
      submit_enabled:      false,
      approve_enabled:     false,
      submit_interval_ms:  30_000,
      approve_interval_ms: 30_000,
    }
  }
}
