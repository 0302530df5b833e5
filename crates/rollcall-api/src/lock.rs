//! The attendance lock and its `/lock` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/lock` | `{"locked": bool}` |
//! | `PUT`  | `/lock` | Body: `{"locked": bool}`; needs `can_toggle_lock` |

use std::sync::atomic::{AtomicBool, Ordering};

use axum::{Json, extract::State};
use chrono::NaiveDate;
use rollcall_core::{Error, staff::Role, store::AttendanceStore};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::Authenticated, error::ApiError};

/// Open/closed flag for today's attendance. While locked, presence records
/// dated today cannot be created, changed or removed. Other dates stay
/// editable so past sessions can be corrected.
#[derive(Debug, Default)]
pub struct AttendanceLock(AtomicBool);

impl AttendanceLock {
  pub fn new(locked: bool) -> Self { Self(AtomicBool::new(locked)) }

  pub fn is_locked(&self) -> bool { self.0.load(Ordering::Acquire) }

  /// Set the flag and return its previous value.
  pub fn set(&self, locked: bool) -> bool { self.0.swap(locked, Ordering::AcqRel) }

  /// Refuse a presence mutation on `date` if it is `today` and the lock is
  /// closed.
  pub fn check(&self, date: NaiveDate, today: NaiveDate) -> rollcall_core::Result<()> {
    if date == today && self.is_locked() {
      Err(Error::AttendanceLocked)
    } else {
      Ok(())
    }
  }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LockState {
  pub locked: bool,
}

/// `GET /lock`
pub async fn get_lock<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
) -> Json<LockState>
where
  S: AttendanceStore + 'static,
{
  Json(LockState { locked: state.lock.is_locked() })
}

/// `PUT /lock`
pub async fn set_lock<S>(
  State(state): State<AppState<S>>,
  Authenticated(session): Authenticated,
  Json(body): Json<LockState>,
) -> Result<Json<LockState>, ApiError>
where
  S: AttendanceStore + 'static,
{
  Role::require(session.role.can_toggle_lock(), "toggle the attendance lock")?;
  let was = state.lock.set(body.locked);
  if was != body.locked {
    tracing::info!(by = %session.username, locked = body.locked, "attendance lock changed");
  }
  Ok(Json(LockState { locked: body.locked }))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, 1, d).unwrap() }

  #[test]
  fn lock_only_guards_today() {
    let lock = AttendanceLock::new(false);
    assert!(lock.check(day(5), day(5)).is_ok());

    assert!(!lock.set(true));
    assert!(matches!(lock.check(day(5), day(5)), Err(Error::AttendanceLocked)));
    assert!(lock.check(day(4), day(5)).is_ok());

    assert!(lock.set(false));
    assert!(lock.check(day(5), day(5)).is_ok());
  }
}
