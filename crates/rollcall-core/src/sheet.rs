//! The check-in sheet: a client-side view of one date's roster.
//!
//! Edits are applied to the sheet first and handed back as a
//! [`PendingChange`]. The caller sends the change's [`Mutation`] to the store,
//! then either rebuilds the sheet from a fresh read with
//! [`CheckInSheet::reconcile`] or rolls the row back with
//! [`CheckInSheet::revert`] if the write failed.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  analytics::{VisitStatus, tally::visit_counts},
  presence::{PresenceFields, PresenceKey, PresenceRecord, Service},
  subject::Subject,
};

/// One subject's line on the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
  pub subject:      Subject,
  pub present:      bool,
  pub memory_verse: bool,
  pub remarks:      Option<String>,
  /// Distinct dates present across the whole history.
  pub visits:       usize,
  /// Present on this date at a different service, so the date already
  /// counts as a visit.
  pub seen_today:   bool,
}

impl SheetRow {
  pub fn status(&self) -> VisitStatus { VisitStatus::from_count(self.visits) }
}

/// A store write produced by a sheet edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
  Upsert { key: PresenceKey, fields: PresenceFields },
  Delete { key: PresenceKey },
}

impl Mutation {
  pub fn key(&self) -> PresenceKey {
    match self {
      Self::Upsert { key, .. } | Self::Delete { key } => *key,
    }
  }
}

/// An edit already shown on the sheet but not yet confirmed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
  pub subject_id: Uuid,
  pub mutation:   Mutation,
  previous:       SheetRow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInSheet {
  pub date:    NaiveDate,
  pub service: Service,
  rows:        Vec<SheetRow>,
}

impl CheckInSheet {
  /// Lay out `roster` for `date`, reading presence and visit counts from
  /// `history`. Rows are ordered by full name.
  pub fn build(
    date: NaiveDate,
    service: Service,
    roster: &[Subject],
    history: &[PresenceRecord],
  ) -> Self {
    let counts = visit_counts(history);
    let elsewhere: HashSet<Uuid> = history
      .iter()
      .filter(|r| r.date == date && r.service != service)
      .map(|r| r.subject_id)
      .collect();

    let mut rows: Vec<SheetRow> = roster
      .iter()
      .map(|s| {
        let today = history.iter().find(|r| {
          r.subject_id == s.subject_id && r.date == date && r.service == service
        });
        SheetRow {
          subject:      s.clone(),
          present:      today.is_some(),
          memory_verse: today.is_some_and(|r| r.memory_verse),
          remarks:      today.and_then(|r| r.remarks.clone()),
          visits:       counts.get(&s.subject_id).copied().unwrap_or(0),
          seen_today:   elsewhere.contains(&s.subject_id),
        }
      })
      .collect();
    rows.sort_by(|a, b| a.subject.full_name.cmp(&b.subject.full_name));

    Self { date, service, rows }
  }

  pub fn rows(&self) -> &[SheetRow] { &self.rows }

  pub fn row(&self, subject_id: Uuid) -> Option<&SheetRow> {
    self.rows.iter().find(|r| r.subject.subject_id == subject_id)
  }

  fn key(&self, subject_id: Uuid) -> PresenceKey {
    PresenceKey { subject_id, date: self.date, service: self.service }
  }

  fn row_mut(&mut self, subject_id: Uuid) -> Result<&mut SheetRow> {
    self
      .rows
      .iter_mut()
      .find(|r| r.subject.subject_id == subject_id)
      .ok_or(Error::SubjectNotFound(subject_id))
  }

  /// Flip presence. Marking absent drops the verse and remark along with the
  /// record.
  pub fn toggle(&mut self, subject_id: Uuid) -> Result<PendingChange> {
    let key = self.key(subject_id);
    let row = self.row_mut(subject_id)?;
    let previous = row.clone();

    let mutation = if row.present {
      row.present = false;
      row.memory_verse = false;
      row.remarks = None;
      if !row.seen_today {
        row.visits = row.visits.saturating_sub(1);
      }
      Mutation::Delete { key }
    } else {
      row.present = true;
      if !row.seen_today {
        row.visits += 1;
      }
      Mutation::Upsert { key, fields: PresenceFields::default() }
    };

    Ok(PendingChange { subject_id, mutation, previous })
  }

  pub fn set_verse(&mut self, subject_id: Uuid, recited: bool) -> Result<PendingChange> {
    let key = self.key(subject_id);
    let row = self.row_mut(subject_id)?;
    if !row.present {
      return Err(Error::NotPresent(subject_id));
    }
    let previous = row.clone();
    row.memory_verse = recited;

    let fields = PresenceFields { memory_verse: Some(recited), remarks: None };
    Ok(PendingChange { subject_id, mutation: Mutation::Upsert { key, fields }, previous })
  }

  /// Replace the remark. Blank text clears it.
  pub fn set_remarks(
    &mut self,
    subject_id: Uuid,
    text: impl Into<String>,
  ) -> Result<PendingChange> {
    let key = self.key(subject_id);
    let row = self.row_mut(subject_id)?;
    if !row.present {
      return Err(Error::NotPresent(subject_id));
    }
    let previous = row.clone();
    let fields = PresenceFields { memory_verse: None, remarks: Some(text.into()) };
    row.remarks = fields.normalized_remarks().flatten();

    Ok(PendingChange { subject_id, mutation: Mutation::Upsert { key, fields }, previous })
  }

  /// Undo a change whose mutation the store rejected.
  pub fn revert(&mut self, change: PendingChange) {
    if let Ok(row) = self.row_mut(change.subject_id) {
      *row = change.previous;
    }
  }

  /// Rebuild from an authoritative read, discarding any local state.
  pub fn reconcile(&mut self, roster: &[Subject], history: &[PresenceRecord]) {
    *self = Self::build(self.date, self.service, roster, history);
  }

  pub fn new_arrivals(&self) -> impl Iterator<Item = &SheetRow> {
    self.rows.iter().filter(|r| r.status().is_new())
  }

  pub fn regulars(&self) -> impl Iterator<Item = &SheetRow> {
    self.rows.iter().filter(|r| !r.status().is_new())
  }

  pub fn present_count(&self) -> usize {
    self.rows.iter().filter(|r| r.present).count()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analytics::fixtures::*;

  fn sheet(roster: &[Subject], history: &[PresenceRecord]) -> CheckInSheet {
    CheckInSheet::build(sunday(3), Service::SundaySchool, roster, history)
  }

  #[test]
  fn build_reads_presence_and_visits() {
    let ana = student("Ana");
    let ben = student("Ben");
    let mut today = with_verse(present(&ana, sunday(3)));
    today.remarks = Some("sang".into());
    let history = vec![present(&ana, sunday(1)), present(&ana, sunday(2)), today];

    let s = sheet(&[ben.clone(), ana.clone()], &history);
    assert_eq!(s.rows()[0].subject.full_name, "Ana");
    let row = s.row(ana.subject_id).unwrap();
    assert!(row.present && row.memory_verse);
    assert_eq!(row.remarks.as_deref(), Some("sang"));
    assert_eq!(row.status(), VisitStatus::Regular);
    assert_eq!(s.present_count(), 1);
    assert_eq!(s.new_arrivals().count(), 1);
    assert_eq!(s.regulars().count(), 1);
  }

  #[test]
  fn toggle_on_then_off_restores_sheet() {
    let ana = student("Ana");
    let history = vec![present(&ana, sunday(1))];
    let original = sheet(std::slice::from_ref(&ana), &history);
    let mut s = original.clone();

    let on = s.toggle(ana.subject_id).unwrap();
    assert!(matches!(on.mutation, Mutation::Upsert { .. }));
    assert_eq!(s.row(ana.subject_id).unwrap().visits, 2);

    let off = s.toggle(ana.subject_id).unwrap();
    assert_eq!(
      off.mutation,
      Mutation::Delete {
        key: PresenceKey {
          subject_id: ana.subject_id,
          date:       sunday(3),
          service:    Service::SundaySchool,
        },
      }
    );
    assert_eq!(s, original);
  }

  #[test]
  fn other_service_on_same_date_is_not_a_new_visit() {
    let ana = student("Ana");
    let mut evening = present(&ana, sunday(3));
    evening.service = Service::EveningService;
    let mut s = sheet(std::slice::from_ref(&ana), &[evening]);

    s.toggle(ana.subject_id).unwrap();
    assert_eq!(s.row(ana.subject_id).unwrap().visits, 1);
  }

  #[test]
  fn verse_and_remarks_require_presence() {
    let ana = student("Ana");
    let mut s = sheet(std::slice::from_ref(&ana), &[]);
    assert!(matches!(
      s.set_verse(ana.subject_id, true),
      Err(Error::NotPresent(id)) if id == ana.subject_id
    ));
    assert!(matches!(s.set_remarks(ana.subject_id, "x"), Err(Error::NotPresent(_))));
    assert!(matches!(s.toggle(Uuid::new_v4()), Err(Error::SubjectNotFound(_))));

    s.toggle(ana.subject_id).unwrap();
    let change = s.set_remarks(ana.subject_id, "  ").unwrap();
    assert_eq!(s.row(ana.subject_id).unwrap().remarks, None);
    match change.mutation {
      Mutation::Upsert { fields, .. } => assert_eq!(fields.remarks.as_deref(), Some("  ")),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn revert_restores_previous_row() {
    let ana = student("Ana");
    let mut s = sheet(std::slice::from_ref(&ana), &[present(&ana, sunday(3))]);
    let before = s.clone();

    let change = s.set_verse(ana.subject_id, true).unwrap();
    assert!(s.row(ana.subject_id).unwrap().memory_verse);
    s.revert(change);
    assert_eq!(s, before);
  }

  #[test]
  fn reconcile_takes_store_state() {
    let ana = student("Ana");
    let mut s = sheet(std::slice::from_ref(&ana), &[]);
    s.toggle(ana.subject_id).unwrap();

    let stored = vec![with_verse(present(&ana, sunday(3)))];
    s.reconcile(std::slice::from_ref(&ana), &stored);
    let row = s.row(ana.subject_id).unwrap();
    assert!(row.present && row.memory_verse);
    assert_eq!(row.visits, 1);
  }
}
