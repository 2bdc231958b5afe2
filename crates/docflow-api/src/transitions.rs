//! Handlers for batch transitions.
//!
//! Both endpoints answer `200` with one outcome per requested id, in request
//! order, however many of them failed.

use axum::{Json, extract::State};
use docflow_core::{
  document::DocumentId,
  outcome::Outcome,
  store::DocumentStore,
  transition::Direction,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, validate};

#[derive(Debug, Deserialize)]
pub struct BulkBody {
  pub ids:       Vec<DocumentId>,
  pub initiator: String,
  pub comment:   Option<String>,
}

impl BulkBody {
  fn validate(&self) -> Result<(), ApiError> {
    validate::ids(&self.ids)?;
    validate::not_blank("initiator", &self.initiator)?;
    validate::comment(self.comment.as_deref())
  }
}

/// `POST /documents/submit`
pub async fn submit<S>(
  state: State<AppState<S>>,
  body: Json<BulkBody>,
) -> Result<Json<Vec<Outcome>>, ApiError>
where
  S: DocumentStore + 'static,
{
  run(state, body, Direction::Submit).await
}

/// `POST /documents/approve`
pub async fn approve<S>(
  state: State<AppState<S>>,
  body: Json<BulkBody>,
) -> Result<Json<Vec<Outcome>>, ApiError>
where
  S: DocumentStore + 'static,
{
  run(state, body, Direction::Approve).await
}

async fn run<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<BulkBody>,
  direction: Direction,
) -> Result<Json<Vec<Outcome>>, ApiError>
where
  S: DocumentStore + 'static,
{
  body.validate()?;
  let outcomes = state
    .batch
    .process_batch(&body.ids, &body.initiator, body.comment.as_deref(), direction)
    .await;
  Ok(Json(outcomes))
}
