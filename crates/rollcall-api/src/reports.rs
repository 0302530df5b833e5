//! Handlers for reports, birthdays and the activity log.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reports` | Present count per date, newest first; `?kind=&service=` |
//! | `GET`  | `/reports/:date` | Who was present; `?kind=&service=` |
//! | `GET`  | `/birthdays` | `?month=` (default this month) `&kind=` |
//! | `GET`  | `/activity` | Verses and remarks, newest first; `?limit=&kind=` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{Datelike as _, NaiveDate};
use rollcall_core::{
  analytics::{
    DateBucket,
    report::{self, ActivityEntry, Attendee},
  },
  presence::PresenceFilter,
  store::AttendanceStore,
  subject::{Subject, SubjectKind},
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  analytics::{RosterParams, snapshot},
  auth::Authenticated,
  error::ApiError,
  today,
};

/// `GET /reports`
pub async fn summaries<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Query(params): Query<RosterParams>,
) -> Result<Json<Vec<DateBucket>>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let filter = PresenceFilter::for_roster(params.kind, params.service);
  let records = state
    .store
    .list_presence(&filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(report::date_summaries(&records)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DateReport {
  pub date:      NaiveDate,
  pub attendees: Vec<Attendee>,
}

/// `GET /reports/:date`
pub async fn attendees<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Path(date): Path<NaiveDate>,
  Query(params): Query<RosterParams>,
) -> Result<Json<DateReport>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let roster = state
    .store
    .list_subjects(params.kind)
    .await
    .map_err(ApiError::store)?;
  let filter = PresenceFilter {
    date: Some(date),
    ..PresenceFilter::for_roster(params.kind, params.service)
  };
  let records = state
    .store
    .list_presence(&filter)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(DateReport {
    date,
    attendees: report::attendees_on(date, &roster, &records),
  }))
}

#[derive(Debug, Deserialize)]
pub struct BirthdayParams {
  pub month: Option<u32>,
  pub kind:  Option<SubjectKind>,
}

/// `GET /birthdays`
pub async fn birthdays<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Query(params): Query<BirthdayParams>,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let month = params.month.unwrap_or_else(|| today().month());
  if !(1..=12).contains(&month) {
    return Err(ApiError::BadRequest(format!("invalid month {month}")));
  }
  let roster = state
    .store
    .list_subjects(params.kind)
    .await
    .map_err(ApiError::store)?;
  let celebrants = report::birthdays_in_month(&roster, month)
    .into_iter()
    .cloned()
    .collect();
  Ok(Json(celebrants))
}

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
  pub limit: Option<usize>,
  pub kind:  Option<SubjectKind>,
}

/// `GET /activity`
pub async fn activity<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Query(params): Query<ActivityParams>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError>
where
  S: AttendanceStore + 'static,
{
  let (roster, records) = snapshot(state.store.as_ref(), params.kind, None).await?;
  Ok(Json(report::activity_log(&roster, &records, params.limit.unwrap_or(50))))
}
