//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subjects` | Optional `?kind=student\|member` |
//! | `POST`   | `/subjects` | Body: [`NewSubject`] |
//! | `GET`    | `/subjects/:id` | 404 if not found |
//! | `PUT`    | `/subjects/:id` | Replaces every editable field |
//! | `DELETE` | `/subjects/:id` | Removes presence history too |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use rollcall_core::{
  staff::Role,
  store::AttendanceStore,
  subject::{NewSubject, Subject, SubjectKind},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

fn validate(input: &mut NewSubject) -> Result<(), ApiError> {
  input.full_name = input.full_name.trim().to_owned();
  if input.full_name.is_empty() {
    return Err(ApiError::BadRequest("full_name must not be empty".into()));
  }
  Ok(())
}

async fn fetch<S>(store: &S, id: Uuid) -> Result<Subject, ApiError>
where
  S: AttendanceStore,
{
  store
    .get_subject(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub kind: Option<SubjectKind>,
}

/// `GET /subjects[?kind=<kind>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let subjects = state
    .store
    .list_subjects(params.kind)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subjects))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /subjects`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(mut body): Json<NewSubject>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AttendanceStore + 'static,
{
  Role::require(session.role.can_edit_subjects(body.kind), "add to this roster")?;
  validate(&mut body)?;
  let subject = state.store.add_subject(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /subjects/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError>
where
  S: AttendanceStore + 'static,
{
  Ok(Json(fetch(state.store.as_ref(), id).await?))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /subjects/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<Uuid>,
  Json(mut body): Json<NewSubject>,
) -> Result<Json<Subject>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let existing = fetch(state.store.as_ref(), id).await?;
  Role::require(
    session.role.can_edit_subjects(existing.kind)
      && session.role.can_edit_subjects(body.kind),
    "edit this subject",
  )?;
  validate(&mut body)?;

  let subject = state
    .store
    .update_subject(id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  Ok(Json(subject))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /subjects/:id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: AttendanceStore + 'static,
{
  let existing = fetch(state.store.as_ref(), id).await?;
  Role::require(session.role.can_delete_subjects(existing.kind), "delete this subject")?;

  state.store.delete_subject(id).await.map_err(ApiError::store)?;
  tracing::info!(by = %session.username, subject = %existing.full_name, "subject deleted");
  Ok(StatusCode::NO_CONTENT)
}
