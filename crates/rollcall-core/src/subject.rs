//! Subjects: the people tracked, either a child in the kids' ministry or a
//! member of the congregation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which roster a subject belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
  /// A child checked in at Sunday school.
  Student,
  /// A congregation member checked in by the ushers.
  Member,
}

/// A tracked person. Presence history lives in separate records and is
/// removed together with the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:     Uuid,
  pub kind:           SubjectKind,
  pub full_name:      String,
  pub nickname:       Option<String>,
  /// Grade level for students, age group for members.
  pub group:          Option<String>,
  pub gender:         Option<String>,
  pub birthday:       Option<NaiveDate>,
  /// Externally hosted profile photo; no image data is stored here.
  pub photo_url:      Option<String>,
  pub ministry:       Option<String>,
  pub contact_number: Option<String>,
  pub address:        Option<String>,
  pub first_visit:    Option<NaiveDate>,
  pub created_at:     DateTime<Utc>,
}

impl Subject {
  /// The short name shown on cards: the nickname if set, otherwise the first
  /// word of the full name.
  pub fn display_name(&self) -> &str {
    match self.nickname.as_deref().map(str::trim) {
      Some(nick) if !nick.is_empty() => nick,
      _ => self
        .full_name
        .split_whitespace()
        .next()
        .unwrap_or(&self.full_name),
    }
  }
}

/// Input to [`crate::store::AttendanceStore::add_subject`] and
/// [`crate::store::AttendanceStore::update_subject`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubject {
  pub kind:           SubjectKind,
  pub full_name:      String,
  #[serde(default)]
  pub nickname:       Option<String>,
  #[serde(default)]
  pub group:          Option<String>,
  #[serde(default)]
  pub gender:         Option<String>,
  #[serde(default)]
  pub birthday:       Option<NaiveDate>,
  #[serde(default)]
  pub photo_url:      Option<String>,
  #[serde(default)]
  pub ministry:       Option<String>,
  #[serde(default)]
  pub contact_number: Option<String>,
  #[serde(default)]
  pub address:        Option<String>,
  #[serde(default)]
  pub first_visit:    Option<NaiveDate>,
}

impl NewSubject {
  /// Convenience constructor with all optional fields empty.
  pub fn new(kind: SubjectKind, full_name: impl Into<String>) -> Self {
    Self {
      kind,
      full_name: full_name.into(),
      nickname: None,
      group: None,
      gender: None,
      birthday: None,
      photo_url: None,
      ministry: None,
      contact_number: None,
      address: None,
      first_visit: None,
    }
  }

  /// Materialise a [`Subject`] with a fresh id and creation timestamp.
  pub fn into_subject(self, subject_id: Uuid, created_at: DateTime<Utc>) -> Subject {
    Subject {
      subject_id,
      kind: self.kind,
      full_name: self.full_name,
      nickname: self.nickname,
      group: self.group,
      gender: self.gender,
      birthday: self.birthday,
      photo_url: self.photo_url,
      ministry: self.ministry,
      contact_number: self.contact_number,
      address: self.address,
      first_visit: self.first_visit,
      created_at,
    }
  }
}
