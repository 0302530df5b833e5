//! Visit tally: how many times each subject has been present, and whether
//! that makes them new or regular.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{presence::PresenceRecord, subject::Subject};

/// Visits needed before a subject stops being "new".
pub const REGULAR_THRESHOLD: usize = 3;

/// Classification of a subject by cumulative visit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
  /// On the roster but never present.
  New,
  FirstVisit,
  SecondVisit,
  Regular,
}

impl VisitStatus {
  pub fn from_count(visits: usize) -> Self {
    match visits {
      0 => Self::New,
      1 => Self::FirstVisit,
      2 => Self::SecondVisit,
      _ => Self::Regular,
    }
  }

  /// Everything below [`REGULAR_THRESHOLD`] counts as new.
  pub fn is_new(self) -> bool { self != Self::Regular }

  /// Badge text shown next to the subject's name.
  pub fn label(self) -> &'static str {
    match self {
      Self::New => "NEW",
      Self::FirstVisit => "1st VISIT",
      Self::SecondVisit => "2nd VISIT",
      Self::Regular => "REGULAR",
    }
  }
}

/// Distinct present dates per subject.
///
/// The store already guarantees one record per key, but a subject may hold
/// records for several services on one date; those count once.
pub fn visit_counts(records: &[PresenceRecord]) -> HashMap<Uuid, usize> {
  let mut dates: HashMap<Uuid, BTreeSet<NaiveDate>> = HashMap::new();
  for r in records {
    dates.entry(r.subject_id).or_default().insert(r.date);
  }
  dates.into_iter().map(|(id, d)| (id, d.len())).collect()
}

/// One roster subject's tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectTally {
  pub subject_id: Uuid,
  pub full_name:  String,
  pub visits:     usize,
  pub status:     VisitStatus,
}

/// Result of [`tally`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
  /// One entry per roster subject, ordered by full name.
  pub entries:         Vec<SubjectTally>,
  /// Records referring to subjects missing from the roster. These come
  /// from roster and presence snapshots that were read separately and
  /// disagree; they are excluded from `entries`.
  pub unknown_records: usize,
}

impl Tally {
  pub fn new_arrivals(&self) -> impl Iterator<Item = &SubjectTally> {
    self.entries.iter().filter(|e| e.status.is_new())
  }

  pub fn regulars(&self) -> impl Iterator<Item = &SubjectTally> {
    self.entries.iter().filter(|e| !e.status.is_new())
  }
}

/// Count visits for every subject on `roster`.
pub fn tally(roster: &[Subject], records: &[PresenceRecord]) -> Tally {
  let known: HashSet<Uuid> = roster.iter().map(|s| s.subject_id).collect();
  let unknown_records = records
    .iter()
    .filter(|r| !known.contains(&r.subject_id))
    .count();

  let counts = visit_counts(records);
  let mut entries: Vec<SubjectTally> = roster
    .iter()
    .map(|s| {
      let visits = counts.get(&s.subject_id).copied().unwrap_or(0);
      SubjectTally {
        subject_id: s.subject_id,
        full_name:  s.full_name.clone(),
        visits,
        status:     VisitStatus::from_count(visits),
      }
    })
    .collect();
  entries.sort_by(|a, b| a.full_name.cmp(&b.full_name));

  Tally { entries, unknown_records }
}
