//! Handlers for `/documents` reads and creation.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/documents` | Body: `{"author","title","initiator"}`; 201 + document |
//! | `GET`  | `/documents/{id}` | Document with history; 404 if not found |
//! | `POST` | `/documents/batch` | Body: `[id, ...]`; the documents that exist |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use docflow_core::{
  document::{Document, DocumentId, NewDocument},
  store::DocumentStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, validate};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub author:    String,
  pub title:     String,
  pub initiator: String,
}

/// `POST /documents`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
{
  validate::length("author", &body.author, validate::AUTHOR_CHARS)?;
  validate::length("title", &body.title, validate::TITLE_CHARS)?;
  validate::not_blank("initiator", &body.initiator)?;

  let document = state
    .store
    .create_document(NewDocument::new(body.author, body.title, body.initiator))
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    document_id = document.id,
    document_number = %document.document_number,
    "document created"
  );
  Ok((StatusCode::CREATED, Json(document)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /documents/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<DocumentId>,
) -> Result<Json<Document>, ApiError>
where
  S: DocumentStore + 'static,
{
  let document = state
    .store
    .get_document(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("document {id} not found")))?;
  Ok(Json(document))
}

// ─── Get many ─────────────────────────────────────────────────────────────────

/// `POST /documents/batch`. Unknown ids are left out of the response.
pub async fn get_many<S>(
  State(state): State<AppState<S>>,
  Json(ids): Json<Vec<DocumentId>>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: DocumentStore + 'static,
{
  validate::ids(&ids)?;
  let documents = state.store.get_documents(ids).await.map_err(ApiError::store)?;
  tracing::debug!(found = documents.len(), "batch fetch");
  Ok(Json(documents))
}
