//! Presence records: one attendance mark for a subject on one date.
//!
//! Absence is never stored. A subject is absent on a date exactly when no
//! record exists for its [`PresenceKey`]. Writing an explicit "absent" row
//! would break the set-difference logic in
//! [`crate::analytics::follow_up`], which is why [`PresenceStatus`] has a
//! single variant and the stores refuse any other value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::subject::SubjectKind;

// ─── Status ──────────────────────────────────────────────────────────────────

/// The only status a stored record can carry.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PresenceStatus {
  #[default]
  Present,
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// The gathering a presence record belongs to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
  Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Service {
  /// Kids' ministry; the only service students are checked in to.
  #[default]
  SundaySchool,
  MorningService,
  EveningService,
  SpecialEvent,
}

impl Service {
  /// The service a subject of `kind` is checked in to when none is given.
  pub fn default_for(kind: SubjectKind) -> Self {
    match kind {
      SubjectKind::Student => Self::SundaySchool,
      SubjectKind::Member => Self::MorningService,
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// Uniqueness key of a presence record. At most one record exists per key;
/// writes are upserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresenceKey {
  pub subject_id: Uuid,
  pub date:       NaiveDate,
  pub service:    Service,
}

/// A stored attendance mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
  pub subject_id:   Uuid,
  pub date:         NaiveDate,
  pub service:      Service,
  pub status:       PresenceStatus,
  /// Whether the memory verse was recited at this session.
  pub memory_verse: bool,
  pub remarks:      Option<String>,
  /// Server-assigned; refreshed on every upsert.
  pub recorded_at:  DateTime<Utc>,
}

impl PresenceRecord {
  pub fn key(&self) -> PresenceKey {
    PresenceKey {
      subject_id: self.subject_id,
      date:       self.date,
      service:    self.service,
    }
  }
}

/// Optional fields supplied to an upsert.
///
/// `None` leaves an existing value untouched (and uses the default on
/// insert). `remarks: Some("")` clears the remark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceFields {
  #[serde(default)]
  pub memory_verse: Option<bool>,
  #[serde(default)]
  pub remarks:      Option<String>,
}

impl PresenceFields {
  /// The remark as it should be stored: blank text becomes `None`.
  pub fn normalized_remarks(&self) -> Option<Option<String>> {
    self.remarks.as_ref().map(|r| {
      let trimmed = r.trim();
      (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::AttendanceStore::list_presence`].
/// Every field narrows the result; the default returns everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceFilter {
  /// Exact date.
  pub date:       Option<NaiveDate>,
  /// Inclusive lower bound.
  pub from:       Option<NaiveDate>,
  /// Inclusive upper bound.
  pub to:         Option<NaiveDate>,
  pub subject_id: Option<Uuid>,
  pub service:    Option<Service>,
  /// Restrict to subjects of one roster.
  pub kind:       Option<SubjectKind>,
}

impl PresenceFilter {
  pub fn for_subject(subject_id: Uuid) -> Self {
    Self { subject_id: Some(subject_id), ..Self::default() }
  }

  pub fn for_roster(kind: Option<SubjectKind>, service: Option<Service>) -> Self {
    Self { kind, service, ..Self::default() }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use super::*;

  #[test]
  fn service_string_forms_match_serde() {
    assert_eq!(Service::MorningService.to_string(), "MORNING_SERVICE");
    assert_eq!(Service::from_str("SPECIAL_EVENT").unwrap(), Service::SpecialEvent);
    assert_eq!(
      serde_json::to_string(&Service::SundaySchool).unwrap(),
      "\"SUNDAY_SCHOOL\""
    );
  }

  #[test]
  fn only_present_parses() {
    assert_eq!(PresenceStatus::from_str("PRESENT").unwrap(), PresenceStatus::Present);
    assert!(PresenceStatus::from_str("ABSENT").is_err());
  }

  #[test]
  fn blank_remarks_normalize_to_clear() {
    let f = PresenceFields { memory_verse: None, remarks: Some("   ".into()) };
    assert_eq!(f.normalized_remarks(), Some(None));

    let f = PresenceFields { memory_verse: None, remarks: Some(" shy ".into()) };
    assert_eq!(f.normalized_remarks(), Some(Some("shy".into())));

    assert_eq!(PresenceFields::default().normalized_remarks(), None);
  }
}
