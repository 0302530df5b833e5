//! [`SqliteStore`]: the SQLite implementation of [`AttendanceStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use rollcall_core::{
  presence::{PresenceFields, PresenceFilter, PresenceKey, PresenceRecord, PresenceStatus},
  staff::{LoginEvent, NewStaff, StaffUser},
  store::AttendanceStore,
  subject::{NewSubject, Subject, SubjectKind},
};

use crate::{
  Error, Result,
  encode::{
    PRESENCE_COLUMNS, RawLogin, RawPresence, RawStaff, RawSubject, STAFF_COLUMNS,
    SUBJECT_COLUMNS, encode_date, encode_dt, encode_subject_kind, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rollcall store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write every column of `subject`. An existing row keeps its
  /// `created_at`.
  async fn write_subject(&self, subject: &Subject) -> Result<()> {
    let id_str          = encode_uuid(subject.subject_id);
    let kind_str        = encode_subject_kind(subject.kind).to_owned();
    let full_name       = subject.full_name.clone();
    let nickname        = subject.nickname.clone();
    let group           = subject.group.clone();
    let gender          = subject.gender.clone();
    let birthday_str    = subject.birthday.map(encode_date);
    let photo_url       = subject.photo_url.clone();
    let ministry        = subject.ministry.clone();
    let contact_number  = subject.contact_number.clone();
    let address         = subject.address.clone();
    let first_visit_str = subject.first_visit.map(encode_date);
    let created_at_str  = encode_dt(subject.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO subjects ({SUBJECT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT (subject_id) DO UPDATE SET
               kind           = excluded.kind,
               full_name      = excluded.full_name,
               nickname       = excluded.nickname,
               group_name     = excluded.group_name,
               gender         = excluded.gender,
               birthday       = excluded.birthday,
               photo_url      = excluded.photo_url,
               ministry       = excluded.ministry,
               contact_number = excluded.contact_number,
               address        = excluded.address,
               first_visit    = excluded.first_visit"
          ),
          rusqlite::params![
            id_str,
            kind_str,
            full_name,
            nickname,
            group,
            gender,
            birthday_str,
            photo_url,
            ministry,
            contact_number,
            address,
            first_visit_str,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let subject = input.into_subject(Uuid::new_v4(), now());
    self.write_subject(&subject).await?;
    Ok(subject)
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
            rusqlite::params![id_str],
            RawSubject::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self, kind: Option<SubjectKind>) -> Result<Vec<Subject>> {
    let kind_str = kind.map(encode_subject_kind).map(str::to_owned);

    let raws: Vec<RawSubject> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects
           WHERE ?1 IS NULL OR kind = ?1
           ORDER BY full_name, subject_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![kind_str], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn update_subject(&self, id: Uuid, input: NewSubject) -> Result<Option<Subject>> {
    let Some(existing) = self.get_subject(id).await? else {
      return Ok(None);
    };
    let subject = input.into_subject(id, existing.created_at);
    self.write_subject(&subject).await?;
    Ok(Some(subject))
  }

  async fn delete_subject(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Presence ──────────────────────────────────────────────────────────────

  async fn list_presence<'a>(
    &'a self,
    filter: &'a PresenceFilter,
  ) -> Result<Vec<PresenceRecord>> {
    let date_str    = filter.date.map(encode_date);
    let from_str    = filter.from.map(encode_date);
    let to_str      = filter.to.map(encode_date);
    let subject_str = filter.subject_id.map(encode_uuid);
    let service_str = filter.service.map(|s| s.to_string());
    let kind_str    = filter.kind.map(encode_subject_kind).map(str::to_owned);

    let raws: Vec<RawPresence> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PRESENCE_COLUMNS}
           FROM presence p
           JOIN subjects s ON s.subject_id = p.subject_id
           WHERE (?1 IS NULL OR p.date = ?1)
             AND (?2 IS NULL OR p.date >= ?2)
             AND (?3 IS NULL OR p.date <= ?3)
             AND (?4 IS NULL OR p.subject_id = ?4)
             AND (?5 IS NULL OR p.service = ?5)
             AND (?6 IS NULL OR s.kind = ?6)
           ORDER BY p.date, s.full_name, p.subject_id, p.service"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              date_str,
              from_str,
              to_str,
              subject_str,
              service_str,
              kind_str,
            ],
            RawPresence::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPresence::into_record).collect()
  }

  async fn upsert_presence(
    &self,
    key: PresenceKey,
    fields: PresenceFields,
  ) -> Result<PresenceRecord> {
    let subject_str   = encode_uuid(key.subject_id);
    let date_str      = encode_date(key.date);
    let service_str   = key.service.to_string();
    let status_str    = PresenceStatus::Present.to_string();
    let verse         = fields.memory_verse;
    let remarks       = fields.normalized_remarks();
    let remarks_given = remarks.is_some();
    let remarks_val   = remarks.flatten();
    let at_str        = encode_dt(now());

    let raw: Option<RawPresence> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM subjects WHERE subject_id = ?1",
            rusqlite::params![subject_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }

        tx.execute(
          "INSERT INTO presence
             (subject_id, date, service, status, memory_verse, remarks, recorded_at)
           VALUES (?1, ?2, ?3, ?4, COALESCE(?5, 0), ?7, ?8)
           ON CONFLICT (subject_id, date, service) DO UPDATE SET
             memory_verse = COALESCE(?5, memory_verse),
             remarks      = CASE WHEN ?6 THEN ?7 ELSE remarks END,
             recorded_at  = ?8",
          rusqlite::params![
            subject_str,
            date_str,
            service_str,
            status_str,
            verse,
            remarks_given,
            remarks_val,
            at_str,
          ],
        )?;

        let raw = tx.query_row(
          &format!(
            "SELECT {PRESENCE_COLUMNS} FROM presence p
             WHERE p.subject_id = ?1 AND p.date = ?2 AND p.service = ?3"
          ),
          rusqlite::params![subject_str, date_str, service_str],
          RawPresence::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw
      .ok_or(Error::SubjectNotFound(key.subject_id))?
      .into_record()
  }

  async fn delete_presence(&self, key: PresenceKey) -> Result<bool> {
    let subject_str = encode_uuid(key.subject_id);
    let date_str    = encode_date(key.date);
    let service_str = key.service.to_string();

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM presence WHERE subject_id = ?1 AND date = ?2 AND service = ?3",
          rusqlite::params![subject_str, date_str, service_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Staff ─────────────────────────────────────────────────────────────────

  async fn add_staff(&self, input: NewStaff) -> Result<StaffUser> {
    let user = StaffUser {
      staff_id:   Uuid::new_v4(),
      username:   input.username,
      full_name:  input.full_name,
      role:       input.role,
      pin_hash:   input.pin_hash,
      created_at: now(),
    };

    let id_str    = encode_uuid(user.staff_id);
    let username  = user.username.clone();
    let full_name = user.full_name.clone();
    let role_str  = user.role.to_string();
    let pin_hash  = user.pin_hash.clone();
    let at_str    = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          &format!("INSERT INTO staff ({STAFF_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
          rusqlite::params![id_str, username, full_name, role_str, pin_hash, at_str],
        ) {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::UsernameTaken(user.username));
    }
    Ok(user)
  }

  async fn find_staff<'a>(&'a self, username: &'a str) -> Result<Option<StaffUser>> {
    let username = username.to_owned();

    let raw: Option<RawStaff> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE username = ?1"),
            rusqlite::params![username],
            RawStaff::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStaff::into_staff).transpose()
  }

  async fn list_staff(&self) -> Result<Vec<StaffUser>> {
    let raws: Vec<RawStaff> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {STAFF_COLUMNS} FROM staff ORDER BY username"))?;
        let rows = stmt
          .query_map([], RawStaff::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStaff::into_staff).collect()
  }

  async fn delete_staff(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM staff WHERE staff_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Login history ─────────────────────────────────────────────────────────

  async fn record_login<'a>(&'a self, user: &'a StaffUser) -> Result<LoginEvent> {
    let event = LoginEvent {
      login_id: Uuid::new_v4(),
      staff_id: user.staff_id,
      username: user.username.clone(),
      role:     user.role,
      login_at: now(),
    };

    let id_str    = encode_uuid(event.login_id);
    let staff_str = encode_uuid(event.staff_id);
    let username  = event.username.clone();
    let role_str  = event.role.to_string();
    let at_str    = encode_dt(event.login_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO login_log (login_id, staff_id, username, role, login_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, staff_str, username, role_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  async fn list_logins(&self, limit: usize) -> Result<Vec<LoginEvent>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawLogin> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT login_id, staff_id, username, role, login_at
           FROM login_log
           ORDER BY login_at DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok(RawLogin {
              login_id: row.get(0)?,
              staff_id: row.get(1)?,
              username: row.get(2)?,
              role:     row.get(3)?,
              login_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLogin::into_event).collect()
  }
}
