//! Absence detector: who has missed each of the last three sessions.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session_dates;
use crate::{presence::PresenceRecord, subject::Subject};

/// Number of most recent distinct session dates a subject must have missed.
pub const FOLLOW_UP_WINDOW: usize = 3;

/// Outcome of [`follow_up`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FollowUp {
  /// Fewer than [`FOLLOW_UP_WINDOW`] sessions have been recorded, so nobody
  /// can be judged absent yet. This is not the same as "nobody is absent".
  InsufficientHistory { recent_dates: Vec<NaiveDate> },
  /// The window was evaluated. `absentees` may be empty, meaning everyone
  /// attended at least once within the window.
  Evaluated {
    /// Most recent first.
    window:    [NaiveDate; FOLLOW_UP_WINDOW],
    /// Ordered by full name.
    absentees: Vec<Subject>,
  },
}

impl FollowUp {
  /// The absentee list, or `None` when history is insufficient.
  pub fn absentees(&self) -> Option<&[Subject]> {
    match self {
      Self::InsufficientHistory { .. } => None,
      Self::Evaluated { absentees, .. } => Some(absentees.as_slice()),
    }
  }
}

/// The first `n` distinct dates with any record, most recent first.
pub fn recent_dates(records: &[PresenceRecord], n: usize) -> Vec<NaiveDate> {
  let mut dates = session_dates(records);
  dates.truncate(n);
  dates
}

/// Find roster subjects with no presence on any of the last
/// [`FOLLOW_UP_WINDOW`] session dates.
///
/// Subjects who have never attended are included once enough history exists.
pub fn follow_up(roster: &[Subject], records: &[PresenceRecord]) -> FollowUp {
  let recent = recent_dates(records, FOLLOW_UP_WINDOW);
  if recent.len() < FOLLOW_UP_WINDOW {
    return FollowUp::InsufficientHistory { recent_dates: recent };
  }
  let mut window = [NaiveDate::MIN; FOLLOW_UP_WINDOW];
  window.copy_from_slice(&recent);

  let present_in_window: HashSet<Uuid> = records
    .iter()
    .filter(|r| window.contains(&r.date))
    .map(|r| r.subject_id)
    .collect();

  let mut absentees: Vec<Subject> = roster
    .iter()
    .filter(|s| !present_in_window.contains(&s.subject_id))
    .cloned()
    .collect();
  absentees.sort_by(|a, b| a.full_name.cmp(&b.full_name));

  FollowUp::Evaluated { window, absentees }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analytics::fixtures::*;

  fn names(f: &FollowUp) -> Vec<&str> {
    f.absentees()
      .expect("evaluated")
      .iter()
      .map(|s| s.full_name.as_str())
      .collect()
  }

  #[test]
  fn fewer_than_three_dates_is_insufficient() {
    let a = student("Ana");
    let records = vec![present(&a, sunday(1)), present(&a, sunday(2))];
    let f = follow_up(&[a.clone(), student("Ben")], &records);
    assert_eq!(
      f,
      FollowUp::InsufficientHistory { recent_dates: vec![sunday(2), sunday(1)] }
    );
    assert!(f.absentees().is_none());

    assert!(matches!(
      follow_up(&[a], &[]),
      FollowUp::InsufficientHistory { recent_dates } if recent_dates.is_empty()
    ));
  }

  #[test]
  fn only_a_present_flags_b_and_c() {
    let a = student("A");
    let b = student("B");
    let c = student("C");
    let records = vec![
      present(&a, sunday(1)),
      present(&a, sunday(2)),
      present(&a, sunday(3)),
    ];
    let f = follow_up(&[c, a, b], &records);
    assert_eq!(names(&f), vec!["B", "C"]);
  }

  #[test]
  fn window_uses_latest_three_dates_only() {
    let a = student("Ana");
    let b = student("Ben");
    // Ben only came on week 1, which falls outside the window 2..=4.
    let records = vec![
      present(&b, sunday(1)),
      present(&a, sunday(2)),
      present(&a, sunday(3)),
      present(&a, sunday(4)),
    ];
    let f = follow_up(&[a, b], &records);
    match &f {
      FollowUp::Evaluated { window, .. } => {
        assert_eq!(window, &[sunday(4), sunday(3), sunday(2)]);
      }
      other => panic!("unexpected {other:?}"),
    }
    assert_eq!(names(&f), vec!["Ben"]);
  }

  #[test]
  fn one_visit_in_window_clears_follow_up() {
    let a = student("Ana");
    let b = student("Ben");
    let records = vec![
      present(&a, sunday(1)),
      present(&a, sunday(2)),
      present(&a, sunday(3)),
      present(&b, sunday(2)),
    ];
    let f = follow_up(&[a, b], &records);
    assert!(names(&f).is_empty());
  }

  #[test]
  fn deleted_subjects_are_not_reported() {
    let a = student("Ana");
    let gone = student("Gone");
    let records = vec![
      present(&a, sunday(1)),
      present(&a, sunday(2)),
      present(&a, sunday(3)),
    ];
    // `gone` has been removed from the roster.
    let f = follow_up(std::slice::from_ref(&a), &records);
    assert!(!names(&f).contains(&gone.full_name.as_str()));
  }
}
