//! The `AttendanceStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `rollcall-store-sqlite`).
//! Higher layers (`rollcall-api`) depend on this abstraction, not on any
//! concrete backend. The analytics engine never touches a store: callers
//! read snapshots through this trait and hand them to the pure functions in
//! [`crate::analytics`].

use std::future::Future;

use uuid::Uuid;

use crate::{
  presence::{PresenceFields, PresenceFilter, PresenceKey, PresenceRecord},
  staff::{LoginEvent, NewStaff, StaffUser},
  subject::{NewSubject, Subject, SubjectKind},
};

/// Abstraction over a Rollcall record store.
///
/// Presence writes are keyed by [`PresenceKey`]: an upsert either inserts the
/// single record for that key or updates it in place. Implementations must
/// never persist a record with any status other than
/// [`PresenceStatus::Present`](crate::presence::PresenceStatus::Present).
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Create and persist a new subject.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Retrieve a subject by UUID. Returns `None` if not found.
  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// List subjects ordered by full name, optionally filtered by kind.
  fn list_subjects(
    &self,
    kind: Option<SubjectKind>,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Replace every editable field of a subject. Returns `None` if not found.
  fn update_subject(
    &self,
    id: Uuid,
    input: NewSubject,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Delete a subject together with its presence history. Returns `false`
  /// if it did not exist.
  fn delete_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Presence ──────────────────────────────────────────────────────────

  /// Return presence records matching `filter`, ordered by date then
  /// subject.
  fn list_presence<'a>(
    &'a self,
    filter: &'a PresenceFilter,
  ) -> impl Future<Output = Result<Vec<PresenceRecord>, Self::Error>> + Send + 'a;

  /// Insert or update the record for `key` and return it as stored.
  fn upsert_presence(
    &self,
    key: PresenceKey,
    fields: PresenceFields,
  ) -> impl Future<Output = Result<PresenceRecord, Self::Error>> + Send + '_;

  /// Remove the record for `key`, marking the subject absent. Returns
  /// `false` if there was nothing to remove.
  fn delete_presence(
    &self,
    key: PresenceKey,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Staff ─────────────────────────────────────────────────────────────

  /// Create a staff account. Usernames are unique.
  fn add_staff(
    &self,
    input: NewStaff,
  ) -> impl Future<Output = Result<StaffUser, Self::Error>> + Send + '_;

  /// Look up a staff account by username.
  fn find_staff<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<StaffUser>, Self::Error>> + Send + 'a;

  /// List staff accounts ordered by username.
  fn list_staff(
    &self,
  ) -> impl Future<Output = Result<Vec<StaffUser>, Self::Error>> + Send + '_;

  /// Remove a staff account. Returns `false` if it did not exist.
  fn delete_staff(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Login history ─────────────────────────────────────────────────────

  /// Append a login event for `user`; the timestamp is set by the store.
  fn record_login<'a>(
    &'a self,
    user: &'a StaffUser,
  ) -> impl Future<Output = Result<LoginEvent, Self::Error>> + Send + 'a;

  /// The most recent `limit` login events, newest first.
  fn list_logins(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<LoginEvent>, Self::Error>> + Send + '_;
}
