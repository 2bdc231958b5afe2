//! `POST /test/{id}?threads=5&attempts=3`: run a contention probe against one
//! submitted document.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use docflow_core::{document::DocumentId, store::DocumentStore};
use docflow_engine::ProbeReport;
use serde::Deserialize;

use crate::{AppState, error::ApiError, validate};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProbeParams {
  pub threads:  usize,
  pub attempts: usize,
}

impl Default for ProbeParams {
  fn default() -> Self { Self { threads: 5, attempts: 3 } }
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<DocumentId>,
  Query(params): Query<ProbeParams>,
) -> Result<Json<ProbeReport>, ApiError>
where
  S: DocumentStore + 'static,
{
  validate::within("threads", params.threads, validate::MAX_PROBE_THREADS)?;
  validate::within("attempts", params.attempts, validate::MAX_PROBE_ATTEMPTS)?;

  let report = state.probe.run(id, params.threads, params.attempts).await?;
  Ok(Json(report))
}
