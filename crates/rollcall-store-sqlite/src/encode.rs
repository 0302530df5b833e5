//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings so they sort as text. Calendar
//! dates are `YYYY-MM-DD`. UUIDs are hyphenated lowercase strings. Enums use
//! their `strum` string forms.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use rollcall_core::{
  presence::{PresenceRecord, PresenceStatus, Service},
  staff::{LoginEvent, Role, StaffUser},
  subject::{Subject, SubjectKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision [`encode_dt`] keeps, so a value handed
/// back from a write equals what later reads return.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_subject_kind(k: SubjectKind) -> &'static str {
  match k {
    SubjectKind::Student => "student",
    SubjectKind::Member => "member",
  }
}

pub fn decode_subject_kind(s: &str) -> Result<SubjectKind> {
  match s {
    "student" => Ok(SubjectKind::Student),
    "member" => Ok(SubjectKind::Member),
    other => Err(unknown("kind", other)),
  }
}

/// Parse a column stored with a `strum` `Display` form.
fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| unknown(column, s))
}

fn unknown(column: &'static str, value: &str) -> Error {
  Error::UnknownValue { column, value: value.to_owned() }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSubject::from_row`].
pub const SUBJECT_COLUMNS: &str = "subject_id, kind, full_name, nickname, \
  group_name, gender, birthday, photo_url, ministry, contact_number, address, \
  first_visit, created_at";

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:     String,
  pub kind:           String,
  pub full_name:      String,
  pub nickname:       Option<String>,
  pub group:          Option<String>,
  pub gender:         Option<String>,
  pub birthday:       Option<String>,
  pub photo_url:      Option<String>,
  pub ministry:       Option<String>,
  pub contact_number: Option<String>,
  pub address:        Option<String>,
  pub first_visit:    Option<String>,
  pub created_at:     String,
}

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:     row.get(0)?,
      kind:           row.get(1)?,
      full_name:      row.get(2)?,
      nickname:       row.get(3)?,
      group:          row.get(4)?,
      gender:         row.get(5)?,
      birthday:       row.get(6)?,
      photo_url:      row.get(7)?,
      ministry:       row.get(8)?,
      contact_number: row.get(9)?,
      address:        row.get(10)?,
      first_visit:    row.get(11)?,
      created_at:     row.get(12)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:     decode_uuid(&self.subject_id)?,
      kind:           decode_subject_kind(&self.kind)?,
      full_name:      self.full_name,
      nickname:       self.nickname,
      group:          self.group,
      gender:         self.gender,
      birthday:       decode_opt_date(self.birthday)?,
      photo_url:      self.photo_url,
      ministry:       self.ministry,
      contact_number: self.contact_number,
      address:        self.address,
      first_visit:    decode_opt_date(self.first_visit)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawPresence::from_row`], qualified for joins.
pub const PRESENCE_COLUMNS: &str = "p.subject_id, p.date, p.service, p.status, \
  p.memory_verse, p.remarks, p.recorded_at";

/// Raw values read directly from a `presence` row.
pub struct RawPresence {
  pub subject_id:   String,
  pub date:         String,
  pub service:      String,
  pub status:       String,
  pub memory_verse: bool,
  pub remarks:      Option<String>,
  pub recorded_at:  String,
}

impl RawPresence {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:   row.get(0)?,
      date:         row.get(1)?,
      service:      row.get(2)?,
      status:       row.get(3)?,
      memory_verse: row.get(4)?,
      remarks:      row.get(5)?,
      recorded_at:  row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<PresenceRecord> {
    Ok(PresenceRecord {
      subject_id:   decode_uuid(&self.subject_id)?,
      date:         decode_date(&self.date)?,
      service:      decode_enum::<Service>("service", &self.service)?,
      status:       decode_enum::<PresenceStatus>("status", &self.status)?,
      memory_verse: self.memory_verse,
      remarks:      self.remarks,
      recorded_at:  decode_dt(&self.recorded_at)?,
    })
  }
}

pub const STAFF_COLUMNS: &str =
  "staff_id, username, full_name, role, pin_hash, created_at";

/// Raw strings read directly from a `staff` row.
pub struct RawStaff {
  pub staff_id:   String,
  pub username:   String,
  pub full_name:  String,
  pub role:       String,
  pub pin_hash:   String,
  pub created_at: String,
}

impl RawStaff {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      staff_id:   row.get(0)?,
      username:   row.get(1)?,
      full_name:  row.get(2)?,
      role:       row.get(3)?,
      pin_hash:   row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_staff(self) -> Result<StaffUser> {
    Ok(StaffUser {
      staff_id:   decode_uuid(&self.staff_id)?,
      username:   self.username,
      full_name:  self.full_name,
      role:       decode_enum::<Role>("role", &self.role)?,
      pin_hash:   self.pin_hash,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `login_log` row.
pub struct RawLogin {
  pub login_id: String,
  pub staff_id: String,
  pub username: String,
  pub role:     String,
  pub login_at: String,
}

impl RawLogin {
  pub fn into_event(self) -> Result<LoginEvent> {
    Ok(LoginEvent {
      login_id: decode_uuid(&self.login_id)?,
      staff_id: decode_uuid(&self.staff_id)?,
      username: self.username,
      role:     decode_enum::<Role>("role", &self.role)?,
      login_at: decode_dt(&self.login_at)?,
    })
  }
}
