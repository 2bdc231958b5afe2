//! Human-readable document and registry numbers.
//!
//! Numbers have the shape `{PREFIX}-{yyyyMMdd}-{XXXXXXXX}`, where the suffix is
//! eight uppercase hex digits taken from a random v4 UUID. They are not a
//! sequence: collisions are possible in principle and are left to the
//! store's UNIQUE constraints to reject.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DOCUMENT_PREFIX: &str = "DOC";
pub const REGISTRY_PREFIX: &str = "REG";

const SUFFIX_LEN: usize = 8;

/// Generate a number for `prefix`, dated by `at`.
pub fn generate(prefix: &str, at: DateTime<Utc>) -> String {
  let mut suffix = Uuid::new_v4().simple().to_string();
  suffix.truncate(SUFFIX_LEN);
  format!("{prefix}-{}-{}", at.format("%Y%m%d"), suffix.to_uppercase())
}

pub fn document_number(at: DateTime<Utc>) -> String { generate(DOCUMENT_PREFIX, at) }

pub fn registry_number(at: DateTime<Utc>) -> String { generate(REGISTRY_PREFIX, at) }

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn number_has_prefix_date_and_suffix() {
    let at = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 0).unwrap();
    let number = registry_number(at);

    let parts: Vec<&str> = number.split('-').collect();
    assert_eq!(parts.len(), 3, "{number}");
    assert_eq!(parts[0], "REG");
    assert_eq!(parts[1], "20240131");
    assert_eq!(parts[2].len(), 8);
    assert!(
      parts[2]
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    );
  }

  #[test]
  fn consecutive_numbers_differ() {
    let at = Utc::now();
    assert_ne!(document_number(at), document_number(at));
  }
}
