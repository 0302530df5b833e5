//! The attendance analytics engine.
//!
//! Every function here is a deterministic, total function of an immutable
//! snapshot: a roster of [`Subject`](crate::subject::Subject)s and a slice of
//! [`PresenceRecord`](crate::presence::PresenceRecord)s read from a store.
//! None of them hold state between calls or perform I/O, so they are safe to
//! call from any number of tasks at once. Callers narrow the records to one
//! roster or service before calling in.

pub mod achievement;
pub mod follow_up;
pub mod report;
pub mod tally;
pub mod trend;

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::presence::PresenceRecord;

pub use achievement::{Badge, Metric, StreakRule, SubjectStats, Tier};
pub use follow_up::{FollowUp, follow_up};
pub use tally::{Tally, VisitStatus, tally};
pub use trend::{DateBucket, Trend, trend};

/// Distinct dates with at least one record, most recent first.
pub fn session_dates(records: &[PresenceRecord]) -> Vec<NaiveDate> {
  let dates: BTreeSet<NaiveDate> = records.iter().map(|r| r.date).collect();
  dates.into_iter().rev().collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
  use chrono::{NaiveDate, Utc};
  use uuid::Uuid;

  use crate::{
    presence::{PresenceRecord, PresenceStatus, Service},
    subject::{NewSubject, Subject, SubjectKind},
  };

  pub fn student(name: &str) -> Subject {
    NewSubject::new(SubjectKind::Student, name).into_subject(Uuid::new_v4(), Utc::now())
  }

  /// Sundays in January 2025, 1-based.
  pub fn sunday(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 5).unwrap() + chrono::Days::new(u64::from(n - 1) * 7)
  }

  pub fn present(subject: &Subject, date: NaiveDate) -> PresenceRecord {
    PresenceRecord {
      subject_id:   subject.subject_id,
      date,
      service:      Service::SundaySchool,
      status:       PresenceStatus::Present,
      memory_verse: false,
      remarks:      None,
      recorded_at:  Utc::now(),
    }
  }

  pub fn with_verse(mut record: PresenceRecord) -> PresenceRecord {
    record.memory_verse = true;
    record
  }
}
