//! Field checks applied before a request reaches the store or the engine.

use docflow_core::document::DocumentId;

use crate::error::ApiError;

pub const MAX_BATCH_IDS: usize = 1000;
pub const MAX_COMMENT_CHARS: usize = 500;
pub const AUTHOR_CHARS: (usize, usize) = (2, 25);
pub const TITLE_CHARS: (usize, usize) = (1, 255);
pub const MAX_PROBE_THREADS: usize = 64;
pub const MAX_PROBE_ATTEMPTS: usize = 100;

pub fn ids(ids: &[DocumentId]) -> Result<(), ApiError> {
  if ids.is_empty() {
    return Err(ApiError::BadRequest("ids must not be empty".into()));
  }
  if ids.len() > MAX_BATCH_IDS {
    return Err(ApiError::BadRequest(format!(
      "at most {MAX_BATCH_IDS} documents can be processed at once"
    )));
  }
  Ok(())
}

pub fn not_blank(field: &str, value: &str) -> Result<(), ApiError> {
  if value.trim().is_empty() {
    return Err(ApiError::BadRequest(format!("{field} must not be blank")));
  }
  Ok(())
}

/// Bounds are inclusive and counted in characters, not bytes.
pub fn length(field: &str, value: &str, (min, max): (usize, usize)) -> Result<(), ApiError> {
  not_blank(field, value)?;
  let len = value.chars().count();
  if !(min..=max).contains(&len) {
    return Err(ApiError::BadRequest(format!(
      "{field} must be between {min} and {max} characters"
    )));
  }
  Ok(())
}

pub fn comment(comment: Option<&str>) -> Result<(), ApiError> {
  match comment {
    Some(c) if c.chars().count() > MAX_COMMENT_CHARS => Err(ApiError::BadRequest(format!(
      "comment must be at most {MAX_COMMENT_CHARS} characters"
    ))),
    _ => Ok(()),
  }
}

pub fn within(field: &str, value: usize, max: usize) -> Result<(), ApiError> {
  if value == 0 || value > max {
    return Err(ApiError::BadRequest(format!("{field} must be between 1 and {max}")));
  }
  Ok(())
}
