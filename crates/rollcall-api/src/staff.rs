//! Handlers for sessions, login history and staff accounts.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/login` | Body: `{"username","pin"}`; no auth header needed |
//! | `GET`    | `/logins` | `?limit=` (default 100); super admin only |
//! | `GET`    | `/staff` | Accounts the caller may manage |
//! | `POST`   | `/staff` | Body: `{"username","full_name","role","pin"}` |
//! | `DELETE` | `/staff/:id` | |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use rollcall_core::{
  staff::{LoginEvent, NewStaff, Role, Session, StaffUser},
  store::AttendanceStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Authenticated, check_credentials, hash_pin, validate_pin},
  error::ApiError,
};

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub pin:      String,
}

/// `POST /login`: check credentials, record the login, return the session.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<Session>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let user = check_credentials(state.store.as_ref(), &body.username, &body.pin).await?;
  state
    .store
    .record_login(&user)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(username = %user.username, role = %user.role, "login");
  Ok(Json(user.session()))
}

#[derive(Debug, Deserialize)]
pub struct LoginsParams {
  pub limit: Option<usize>,
}

/// `GET /logins[?limit=<n>]`
pub async fn logins<S>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Query(params): Query<LoginsParams>,
) -> Result<Json<Vec<LoginEvent>>, ApiError>
where
  S: AttendanceStore + 'static,
{
  Role::require(session.role.can_view_login_history(), "view login history")?;
  let events = state
    .store
    .list_logins(params.limit.unwrap_or(100))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(events))
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// `GET /staff`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
) -> Result<Json<Vec<StaffUser>>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let mut users = state.store.list_staff().await.map_err(ApiError::store)?;
  users.retain(|u| session.role.can_manage_staff(u.role));
  Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub username:  String,
  pub full_name: String,
  pub role:      Role,
  pub pin:       String,
}

/// `POST /staff`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AttendanceStore + 'static,
{
  Role::require(session.role.can_manage_staff(body.role), "create this account")?;

  let username = body.username.trim().to_owned();
  if username.is_empty() || username.contains(':') {
    return Err(ApiError::BadRequest("invalid username".into()));
  }
  validate_pin(&body.pin)?;

  let pin_hash = hash_pin(&body.pin).map_err(|e| ApiError::Internal(e.to_string()))?;
  let added = state
    .store
    .add_staff(NewStaff {
      username: username.clone(),
      full_name: body.full_name.trim().to_owned(),
      role: body.role,
      pin_hash,
    })
    .await;
  let user = match added {
    Ok(user) => user,
    // The store refuses duplicate usernames; report that as a conflict.
    Err(e) => {
      let taken = state
        .store
        .find_staff(&username)
        .await
        .map_err(ApiError::store)?
        .is_some();
      return Err(if taken {
        ApiError::Conflict(format!("username {username} is taken"))
      } else {
        ApiError::store(e)
      });
    }
  };

  tracing::info!(by = %session.username, username = %user.username, role = %user.role, "staff account created");
  Ok((StatusCode::CREATED, Json(user)))
}

/// `DELETE /staff/:id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: AttendanceStore + 'static,
{
  let target = state
    .store
    .list_staff()
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .find(|u| u.staff_id == id)
    .ok_or_else(|| ApiError::NotFound(format!("staff {id} not found")))?;

  Role::require(session.role.can_manage_staff(target.role), "remove this account")?;
  if target.staff_id == session.staff_id {
    return Err(ApiError::Conflict("cannot remove your own account".into()));
  }

  state.store.delete_staff(id).await.map_err(ApiError::store)?;
  tracing::info!(by = %session.username, username = %target.username, "staff account removed");
  Ok(StatusCode::NO_CONTENT)
}
