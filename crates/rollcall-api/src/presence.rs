//! Handlers for `/presence` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/presence` | Query: `date`, `from`, `to`, `subject_id`, `service`, `kind` |
//! | `PUT`    | `/presence/:subject_id/:date` | Body: `{"service"?, "memory_verse"?, "remarks"?}` |
//! | `DELETE` | `/presence/:subject_id/:date` | `?service=`; marks the subject absent |
//!
//! Both writes are refused with `423 Locked` for today's date while the
//! attendance lock is closed.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use chrono::NaiveDate;
use rollcall_core::{
  presence::{PresenceFields, PresenceFilter, PresenceKey, PresenceRecord, Service},
  staff::{Role, Session},
  store::AttendanceStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError, today};

/// `GET /presence`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Query(filter): Query<PresenceFilter>,
) -> Result<Json<Vec<PresenceRecord>>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let records = state
    .store
    .list_presence(&filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

/// Resolve the key for a write and run the permission and lock checks.
async fn authorize_write<S>(
  state: &AppState<S>,
  session: &Session,
  subject_id: Uuid,
  date: NaiveDate,
  service: Option<Service>,
) -> Result<PresenceKey, ApiError>
where
  S: AttendanceStore,
{
  let subject = state
    .store
    .get_subject(subject_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {subject_id} not found")))?;

  Role::require(session.role.can_take_attendance(subject.kind), "take this attendance")?;
  state.lock.check(date, today())?;

  Ok(PresenceKey {
    subject_id,
    date,
    service: service.unwrap_or_else(|| Service::default_for(subject.kind)),
  })
}

#[derive(Debug, Deserialize)]
pub struct MarkBody {
  #[serde(default)]
  pub service: Option<Service>,
  #[serde(flatten)]
  pub fields:  PresenceFields,
}

/// `PUT /presence/:subject_id/:date`: mark present, or update the verse and
/// remark of an existing record.
pub async fn mark<S>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path((subject_id, date)): Path<(Uuid, NaiveDate)>,
  Json(body): Json<MarkBody>,
) -> Result<Json<PresenceRecord>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let key = authorize_write(&state, &session, subject_id, date, body.service).await?;
  let record = state
    .store
    .upsert_presence(key, body.fields)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct UnmarkParams {
  pub service: Option<Service>,
}

/// `DELETE /presence/:subject_id/:date[?service=<service>]`
///
/// Succeeds whether or not a record existed.
pub async fn unmark<S>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path((subject_id, date)): Path<(Uuid, NaiveDate)>,
  Query(params): Query<UnmarkParams>,
) -> Result<StatusCode, ApiError>
where
  S: AttendanceStore + 'static,
{
  let key = authorize_write(&state, &session, subject_id, date, params.service).await?;
  state.store.delete_presence(key).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
