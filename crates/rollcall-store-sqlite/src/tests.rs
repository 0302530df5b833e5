//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use rollcall_core::{
  presence::{PresenceFields, PresenceFilter, PresenceKey, PresenceStatus, Service},
  staff::{NewStaff, Role},
  store::AttendanceStore,
  subject::{NewSubject, SubjectKind},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, 1, d).unwrap() }

fn key(subject_id: Uuid, date: NaiveDate) -> PresenceKey {
  PresenceKey { subject_id, date, service: Service::SundaySchool }
}

fn verse() -> PresenceFields {
  PresenceFields { memory_verse: Some(true), remarks: None }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_subject() {
  let s = store().await;

  let mut input = NewSubject::new(SubjectKind::Student, "Maria Santos");
  input.birthday = Some(day(20));
  input.group = Some("Grade 2".into());
  let subject = s.add_subject(input).await.unwrap();

  let fetched = s.get_subject(subject.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched, subject);
  assert_eq!(fetched.birthday, Some(day(20)));
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  let result = s.get_subject(Uuid::new_v4()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn list_subjects_filtered_and_sorted() {
  let s = store().await;
  s.add_subject(NewSubject::new(SubjectKind::Student, "Zed")).await.unwrap();
  s.add_subject(NewSubject::new(SubjectKind::Member, "Mark")).await.unwrap();
  s.add_subject(NewSubject::new(SubjectKind::Student, "Abby")).await.unwrap();

  let all = s.list_subjects(None).await.unwrap();
  assert_eq!(all.len(), 3);

  let students = s.list_subjects(Some(SubjectKind::Student)).await.unwrap();
  let names: Vec<_> = students.iter().map(|s| s.full_name.as_str()).collect();
  assert_eq!(names, vec!["Abby", "Zed"]);
}

#[tokio::test]
async fn update_subject_keeps_id_and_created_at() {
  let s = store().await;
  let subject = s
    .add_subject(NewSubject::new(SubjectKind::Member, "Jon Cruz"))
    .await
    .unwrap();

  let mut edit = NewSubject::new(SubjectKind::Member, "Jonathan Cruz");
  edit.contact_number = Some("0917".into());
  let updated = s
    .update_subject(subject.subject_id, edit)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.created_at, subject.created_at);

  let fetched = s.get_subject(subject.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched.full_name, "Jonathan Cruz");
  assert_eq!(fetched.contact_number.as_deref(), Some("0917"));

  let missing = s
    .update_subject(Uuid::new_v4(), NewSubject::new(SubjectKind::Member, "x"))
    .await
    .unwrap();
  assert!(missing.is_none());
  assert_eq!(s.list_subjects(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_subject_cascades_presence() {
  let s = store().await;
  let a = s.add_subject(NewSubject::new(SubjectKind::Student, "Ana")).await.unwrap();
  let b = s.add_subject(NewSubject::new(SubjectKind::Student, "Ben")).await.unwrap();
  s.upsert_presence(key(a.subject_id, day(5)), PresenceFields::default())
    .await
    .unwrap();
  s.upsert_presence(key(b.subject_id, day(5)), PresenceFields::default())
    .await
    .unwrap();

  assert!(s.delete_subject(a.subject_id).await.unwrap());
  assert!(!s.delete_subject(a.subject_id).await.unwrap());

  let left = s.list_presence(&PresenceFilter::default()).await.unwrap();
  assert_eq!(left.len(), 1);
  assert_eq!(left[0].subject_id, b.subject_id);
}

// ─── Presence ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_never_duplicates_a_key() {
  let s = store().await;
  let a = s.add_subject(NewSubject::new(SubjectKind::Student, "Ana")).await.unwrap();
  let k = key(a.subject_id, day(5));

  let first = s.upsert_presence(k, PresenceFields::default()).await.unwrap();
  assert_eq!(first.status, PresenceStatus::Present);
  assert!(!first.memory_verse);

  let second = s.upsert_presence(k, verse()).await.unwrap();
  assert!(second.memory_verse);
  assert_eq!(second.key(), k);

  let all = s.list_presence(&PresenceFilter::default()).await.unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn upsert_leaves_unspecified_fields_alone() {
  let s = store().await;
  let a = s.add_subject(NewSubject::new(SubjectKind::Student, "Ana")).await.unwrap();
  let k = key(a.subject_id, day(5));

  s.upsert_presence(k, verse()).await.unwrap();
  let with_remark = s
    .upsert_presence(k, PresenceFields {
      memory_verse: None,
      remarks:      Some("helped clean up".into()),
    })
    .await
    .unwrap();
  assert!(with_remark.memory_verse);
  assert_eq!(with_remark.remarks.as_deref(), Some("helped clean up"));

  let untouched = s.upsert_presence(k, PresenceFields::default()).await.unwrap();
  assert!(untouched.memory_verse);
  assert_eq!(untouched.remarks.as_deref(), Some("helped clean up"));

  let cleared = s
    .upsert_presence(k, PresenceFields { memory_verse: Some(false), remarks: Some(" ".into()) })
    .await
    .unwrap();
  assert!(!cleared.memory_verse);
  assert_eq!(cleared.remarks, None);
}

#[tokio::test]
async fn upsert_for_missing_subject_fails() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s
    .upsert_presence(key(id, day(5)), PresenceFields::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SubjectNotFound(missing) if missing == id));
}

#[tokio::test]
async fn delete_presence_marks_absent() {
  let s = store().await;
  let a = s.add_subject(NewSubject::new(SubjectKind::Student, "Ana")).await.unwrap();
  let k = key(a.subject_id, day(5));
  s.upsert_presence(k, PresenceFields::default()).await.unwrap();

  assert!(s.delete_presence(k).await.unwrap());
  assert!(!s.delete_presence(k).await.unwrap());
  assert!(s.list_presence(&PresenceFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn services_on_one_date_are_separate_keys() {
  let s = store().await;
  let m = s.add_subject(NewSubject::new(SubjectKind::Member, "Mark")).await.unwrap();
  for service in [Service::MorningService, Service::EveningService] {
    let k = PresenceKey { subject_id: m.subject_id, date: day(5), service };
    s.upsert_presence(k, PresenceFields::default()).await.unwrap();
  }

  let all = s.list_presence(&PresenceFilter::for_subject(m.subject_id)).await.unwrap();
  assert_eq!(all.len(), 2);

  let evening = s
    .list_presence(&PresenceFilter::for_roster(None, Some(Service::EveningService)))
    .await
    .unwrap();
  assert_eq!(evening.len(), 1);
}

#[tokio::test]
async fn list_presence_filters() {
  let s = store().await;
  let kid = s.add_subject(NewSubject::new(SubjectKind::Student, "Kid")).await.unwrap();
  let adult = s.add_subject(NewSubject::new(SubjectKind::Member, "Adult")).await.unwrap();
  for d in [5, 12, 19] {
    s.upsert_presence(key(kid.subject_id, day(d)), PresenceFields::default())
      .await
      .unwrap();
  }
  s.upsert_presence(
    PresenceKey {
      subject_id: adult.subject_id,
      date:       day(12),
      service:    Service::MorningService,
    },
    PresenceFields::default(),
  )
  .await
  .unwrap();

  let on_12 = s
    .list_presence(&PresenceFilter { date: Some(day(12)), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(on_12.len(), 2);

  let ranged = s
    .list_presence(&PresenceFilter {
      from: Some(day(12)),
      to: Some(day(19)),
      kind: Some(SubjectKind::Student),
      ..Default::default()
    })
    .await
    .unwrap();
  let dates: Vec<_> = ranged.iter().map(|r| r.date).collect();
  assert_eq!(dates, vec![day(12), day(19)]);
}

// ─── Staff & logins ──────────────────────────────────────────────────────────

fn new_staff(username: &str, role: Role) -> NewStaff {
  NewStaff {
    username:  username.into(),
    full_name: format!("{username} full"),
    role,
    pin_hash:  "$argon2id$placeholder".into(),
  }
}

#[tokio::test]
async fn staff_round_trip_and_unique_username() {
  let s = store().await;
  let t = s.add_staff(new_staff("teacher", Role::Teacher)).await.unwrap();
  s.add_staff(new_staff("admin", Role::Admin)).await.unwrap();

  let found = s.find_staff("teacher").await.unwrap().unwrap();
  assert_eq!(found.staff_id, t.staff_id);
  assert_eq!(found.role, Role::Teacher);
  assert_eq!(found.pin_hash, "$argon2id$placeholder");
  assert!(s.find_staff("nobody").await.unwrap().is_none());

  let names: Vec<_> = s
    .list_staff()
    .await
    .unwrap()
    .into_iter()
    .map(|u| u.username)
    .collect();
  assert_eq!(names, vec!["admin", "teacher"]);

  let dup = s.add_staff(new_staff("teacher", Role::Usher)).await.unwrap_err();
  assert!(matches!(dup, Error::UsernameTaken(name) if name == "teacher"));

  assert!(s.delete_staff(t.staff_id).await.unwrap());
  assert!(!s.delete_staff(t.staff_id).await.unwrap());
}

#[tokio::test]
async fn logins_newest_first_and_limited() {
  let s = store().await;
  let a = s.add_staff(new_staff("a", Role::Usher)).await.unwrap();
  let b = s.add_staff(new_staff("b", Role::SuperAdmin)).await.unwrap();

  s.record_login(&a).await.unwrap();
  tokio::time::sleep(std::time::Duration::from_millis(2)).await;
  let last = s.record_login(&b).await.unwrap();

  let log = s.list_logins(10).await.unwrap();
  assert_eq!(log.len(), 2);
  assert_eq!(log[0].login_id, last.login_id);
  assert_eq!(log[0].login_at, last.login_at);
  assert_eq!(log[0].role, Role::SuperAdmin);

  assert_eq!(s.list_logins(1).await.unwrap().len(), 1);

  // History survives account removal.
  s.delete_staff(a.staff_id).await.unwrap();
  assert_eq!(s.list_logins(10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn staff_created_at_matches_stored_value() {
  let s = store().await;
  let added = s.add_staff(new_staff("teacher", Role::Teacher)).await.unwrap();
  let found = s.find_staff("teacher").await.unwrap().unwrap();
  assert_eq!(found.created_at, added.created_at);
}

#[tokio::test]
async fn racing_creates_with_one_username() {
  let s = store().await;
  let (a, b) = tokio::join!(
    s.add_staff(new_staff("usher", Role::Usher)),
    s.add_staff(new_staff("usher", Role::UsherAdmin)),
  );
  let results = [a, b];
  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  assert!(
    results
      .iter()
      .any(|r| matches!(r, Err(Error::UsernameTaken(name)) if name == "usher"))
  );
  assert_eq!(s.list_staff().await.unwrap().len(), 1);
}
