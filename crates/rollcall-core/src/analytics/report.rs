//! Read-only reports built on the same snapshots as the other analytics:
//! per-date summaries, the attendee list of one date, the birthday list, and
//! the verse/remark activity log.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::trend::{DateBucket, date_buckets};
use crate::{
  presence::{PresenceRecord, Service},
  subject::Subject,
};

/// Every recorded date with its present count, most recent first.
pub fn date_summaries(records: &[PresenceRecord]) -> Vec<DateBucket> {
  let mut buckets = date_buckets(records);
  buckets.reverse();
  buckets
}

/// A roster subject present on a report date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
  pub subject_id: Uuid,
  pub full_name:  String,
  pub group:      Option<String>,
}

/// Subjects present on `date`, ordered by full name. Records for subjects
/// missing from `roster` are skipped; each subject appears once even when
/// present at several services.
pub fn attendees_on(
  date: NaiveDate,
  roster: &[Subject],
  records: &[PresenceRecord],
) -> Vec<Attendee> {
  let by_id: HashMap<Uuid, &Subject> =
    roster.iter().map(|s| (s.subject_id, s)).collect();

  let mut out: Vec<Attendee> = Vec::new();
  for r in records.iter().filter(|r| r.date == date) {
    let Some(s) = by_id.get(&r.subject_id) else { continue };
    if out.iter().any(|a| a.subject_id == s.subject_id) {
      continue;
    }
    out.push(Attendee {
      subject_id: s.subject_id,
      full_name:  s.full_name.clone(),
      group:      s.group.clone(),
    });
  }
  out.sort_by(|a, b| a.full_name.cmp(&b.full_name));
  out
}

/// Subjects whose birthday falls in `month` (1 to 12), ordered by day of
/// month and then name.
pub fn birthdays_in_month(roster: &[Subject], month: u32) -> Vec<&Subject> {
  let mut out: Vec<&Subject> = roster
    .iter()
    .filter(|s| s.birthday.is_some_and(|b| b.month() == month))
    .collect();
  out.sort_by(|a, b| {
    let day = |s: &Subject| s.birthday.map(|d| d.day()).unwrap_or(0);
    day(a).cmp(&day(b)).then_with(|| a.full_name.cmp(&b.full_name))
  });
  out
}

/// A presence record that carries a recited verse or a remark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
  pub subject_id:   Uuid,
  pub full_name:    String,
  pub date:         NaiveDate,
  pub service:      Service,
  pub memory_verse: bool,
  pub remarks:      Option<String>,
}

/// The newest `limit` records with a verse or a remark, most recent first.
pub fn activity_log(
  roster: &[Subject],
  records: &[PresenceRecord],
  limit: usize,
) -> Vec<ActivityEntry> {
  let names: HashMap<Uuid, &str> = roster
    .iter()
    .map(|s| (s.subject_id, s.full_name.as_str()))
    .collect();

  let mut notable: Vec<&PresenceRecord> = records
    .iter()
    .filter(|r| r.memory_verse || r.remarks.is_some())
    .filter(|r| names.contains_key(&r.subject_id))
    .collect();
  notable.sort_by(|a, b| {
    b.date.cmp(&a.date).then_with(|| b.recorded_at.cmp(&a.recorded_at))
  });

  notable
    .into_iter()
    .take(limit)
    .map(|r| ActivityEntry {
      subject_id:   r.subject_id,
      full_name:    names[&r.subject_id].to_owned(),
      date:         r.date,
      service:      r.service,
      memory_verse: r.memory_verse,
      remarks:      r.remarks.clone(),
    })
    .collect()
}
