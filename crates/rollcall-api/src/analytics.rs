//! Handlers for `/analytics` endpoints.
//!
//! Each handler reads one roster and presence snapshot from the store and
//! hands it to the pure functions in [`rollcall_core::analytics`].
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/analytics/tally` | `?kind=&service=` |
//! | `GET`  | `/analytics/follow-up` | `?kind=&service=`; `kind` is required |
//! | `GET`  | `/analytics/trend` | `?kind=&service=&window=` |
//! | `GET`  | `/analytics/subjects/:id/badges` | Stats and the three badges |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use rollcall_core::{
  analytics::{
    self, Badge, FollowUp, SubjectStats, Tally, Trend, VisitStatus, session_dates,
  },
  presence::{PresenceFilter, PresenceRecord, Service},
  store::AttendanceStore,
  subject::{Subject, SubjectKind},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct RosterParams {
  pub kind:    Option<SubjectKind>,
  pub service: Option<Service>,
}

/// Read the roster and its presence records.
pub(crate) async fn snapshot<S>(
  store: &S,
  kind: Option<SubjectKind>,
  service: Option<Service>,
) -> Result<(Vec<Subject>, Vec<PresenceRecord>), ApiError>
where
  S: AttendanceStore,
{
  let roster = store.list_subjects(kind).await.map_err(ApiError::store)?;
  let filter = PresenceFilter::for_roster(kind, service);
  let records = store.list_presence(&filter).await.map_err(ApiError::store)?;
  Ok((roster, records))
}

/// `GET /analytics/tally`
pub async fn tally<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Query(params): Query<RosterParams>,
) -> Result<Json<Tally>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let (roster, records) = snapshot(state.store.as_ref(), params.kind, params.service).await?;
  let tally = analytics::tally(&roster, &records);
  if tally.unknown_records > 0 {
    tracing::warn!(
      unknown = tally.unknown_records,
      "presence records refer to subjects missing from the roster"
    );
  }
  Ok(Json(tally))
}

/// `GET /analytics/follow-up`
pub async fn follow_up<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Query(params): Query<RosterParams>,
) -> Result<Json<FollowUp>, ApiError>
where
  S: AttendanceStore + 'static,
{
  // Session dates only make sense within one roster.
  let Some(kind) = params.kind else {
    return Err(ApiError::BadRequest("follow-up needs a kind".into()));
  };
  let (roster, records) = snapshot(state.store.as_ref(), Some(kind), params.service).await?;
  Ok(Json(analytics::follow_up(&roster, &records)))
}

#[derive(Debug, Deserialize)]
pub struct TrendParams {
  pub kind:    Option<SubjectKind>,
  pub service: Option<Service>,
  pub window:  Option<usize>,
}

/// `GET /analytics/trend`
pub async fn trend<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Query(params): Query<TrendParams>,
) -> Result<Json<Trend>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let window = params.window.unwrap_or(state.settings.trend_window);
  if window == 0 {
    return Err(ApiError::BadRequest("window must be at least 1".into()));
  }
  let filter = PresenceFilter::for_roster(params.kind, params.service);
  let records = state
    .store
    .list_presence(&filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(analytics::trend(&records, window)))
}

/// A subject's achievement card.
#[derive(Debug, Serialize, Deserialize)]
pub struct BadgeReport {
  pub subject_id: Uuid,
  pub full_name:  String,
  pub status:     VisitStatus,
  pub stats:      SubjectStats,
  pub badges:     [Badge; 3],
}

/// `GET /analytics/subjects/:id/badges`
pub async fn badges<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<BadgeReport>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let subject = state
    .store
    .get_subject(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;

  // Sessions are the dates anyone on the same roster attended.
  let filter = PresenceFilter::for_roster(Some(subject.kind), None);
  let records = state
    .store
    .list_presence(&filter)
    .await
    .map_err(ApiError::store)?;
  let held = session_dates(&records);
  let history: Vec<PresenceRecord> =
    records.into_iter().filter(|r| r.subject_id == id).collect();

  let stats = SubjectStats::from_history(&history, &held, state.settings.streak_rule);
  Ok(Json(BadgeReport {
    subject_id: subject.subject_id,
    full_name:  subject.full_name,
    status:     VisitStatus::from_count(stats.total_visits),
    stats,
    badges:     analytics::achievement::badges(&stats),
  }))
}
