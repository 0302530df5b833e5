//! HTTP server wiring for Rollcall.
//!
//! Mounts the JSON API under `/api`, adds request tracing, and makes sure a
//! fresh database has a super admin to log in with.

use std::path::PathBuf;

use axum::Router;
use rollcall_api::{ApiSettings, AppState};
use rollcall_core::{
  staff::{NewStaff, Role},
  store::AttendanceStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `rollcall.toml` and
/// `ROLLCALL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  /// Initial state of the attendance lock.
  #[serde(default)]
  pub attendance_locked: bool,
  #[serde(default)]
  pub analytics:         ApiSettings,
  /// Account created when the staff table is empty.
  #[serde(default)]
  pub bootstrap:         Option<BootstrapAdmin>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapAdmin {
  pub username:  String,
  pub full_name: String,
  /// argon2 PHC string; see `--hash-pin`.
  pub pin_hash:  String,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: AttendanceStore + 'static,
{
  Router::new()
    .nest("/api", rollcall_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Bootstrap ───────────────────────────────────────────────────────────────

/// Create the configured super admin if no staff account exists yet.
/// Returns whether an account was created.
pub async fn bootstrap_admin<S>(
  store: &S,
  admin: Option<&BootstrapAdmin>,
) -> Result<bool, S::Error>
where
  S: AttendanceStore,
{
  if !store.list_staff().await?.is_empty() {
    return Ok(false);
  }
  let Some(admin) = admin else {
    tracing::warn!("no staff accounts exist and no [bootstrap] admin is configured");
    return Ok(false);
  };

  store
    .add_staff(NewStaff {
      username:  admin.username.clone(),
      full_name: admin.full_name.clone(),
      role:      Role::SuperAdmin,
      pin_hash:  admin.pin_hash.clone(),
    })
    .await?;
  tracing::info!(username = %admin.username, "created bootstrap super admin");
  Ok(true)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use rollcall_api::auth::hash_pin;
  use rollcall_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn admin() -> BootstrapAdmin {
    BootstrapAdmin {
      username:  "pastor".into(),
      full_name: "Pastor Dan".into(),
      pin_hash:  hash_pin("9999").unwrap(),
    }
  }

  #[tokio::test]
  async fn bootstrap_runs_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    assert!(!bootstrap_admin(&store, None).await.unwrap());
    assert!(bootstrap_admin(&store, Some(&admin())).await.unwrap());
    assert!(!bootstrap_admin(&store, Some(&admin())).await.unwrap());

    let staff = store.list_staff().await.unwrap();
    assert_eq!(staff.len(), 1);
    assert_eq!(staff[0].role, Role::SuperAdmin);
  }

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    bootstrap_admin(&store, Some(&admin())).await.unwrap();
    let state = AppState::new(Arc::new(store), true, ApiSettings::default());

    let req = Request::builder()
      .uri("/api/lock")
      .header(header::AUTHORIZATION, format!("Basic {}", B64.encode("pastor:9999")))
      .body(Body::empty())
      .unwrap();
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder().uri("/lock").body(Body::empty()).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
