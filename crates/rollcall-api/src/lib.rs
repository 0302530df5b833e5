//! JSON REST API for Rollcall.
//!
//! Exposes an axum [`Router`] backed by any
//! [`rollcall_core::store::AttendanceStore`]. Every route except `POST
//! /login` requires HTTP Basic `username:PIN` credentials. TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rollcall_api::api_router(state))
//! ```

pub mod analytics;
pub mod auth;
pub mod error;
pub mod lock;
pub mod presence;
pub mod reports;
pub mod staff;
pub mod subjects;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use chrono::{Local, NaiveDate};
use rollcall_core::{analytics::StreakRule, store::AttendanceStore};
use serde::Deserialize;

pub use error::ApiError;
pub use lock::AttendanceLock;

// ─── Settings ────────────────────────────────────────────────────────────────

/// Analytics tuning shared by all handlers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
  pub streak_rule:  StreakRule,
  /// Dates shown by `/analytics/trend` when the caller gives no window.
  pub trend_window: usize,
}

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      streak_rule:  StreakRule::default(),
      trend_window: rollcall_core::analytics::trend::DEFAULT_TREND_WINDOW,
    }
  }
}

/// The calendar date the lock applies to.
pub fn today() -> NaiveDate { Local::now().date_naive() }

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub lock:     Arc<AttendanceLock>,
  pub settings: Arc<ApiSettings>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, locked: bool, settings: ApiSettings) -> Self {
    Self {
      store,
      lock: Arc::new(AttendanceLock::new(locked)),
      settings: Arc::new(settings),
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      lock:     Arc::clone(&self.lock),
      settings: Arc::clone(&self.settings),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: AttendanceStore + 'static,
{
  Router::new()
    // Sessions
    .route("/login", post(staff::login::<S>))
    .route("/logins", get(staff::logins::<S>))
    // Staff
    .route("/staff", get(staff::list::<S>).post(staff::create::<S>))
    .route("/staff/{id}", delete(staff::delete_one::<S>))
    // Subjects
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>)
        .put(subjects::update::<S>)
        .delete(subjects::delete_one::<S>),
    )
    // Presence
    .route("/presence", get(presence::list::<S>))
    .route(
      "/presence/{subject_id}/{date}",
      put(presence::mark::<S>).delete(presence::unmark::<S>),
    )
    .route("/lock", get(lock::get_lock::<S>).put(lock::set_lock::<S>))
    // Analytics
    .route("/analytics/tally", get(analytics::tally::<S>))
    .route("/analytics/follow-up", get(analytics::follow_up::<S>))
    .route("/analytics/trend", get(analytics::trend::<S>))
    .route("/analytics/subjects/{id}/badges", get(analytics::badges::<S>))
    // Reports
    .route("/reports", get(reports::summaries::<S>))
    .route("/reports/{date}", get(reports::attendees::<S>))
    .route("/birthdays", get(reports::birthdays::<S>))
    .route("/activity", get(reports::activity::<S>))
    .with_state(state)
}
