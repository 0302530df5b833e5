//! Staff accounts, roles, and the permission table.
//!
//! Every permission decision in the system goes through a predicate on
//! [`Role`]; nothing else compares role names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result, subject::SubjectKind};

// ─── Roles ───────────────────────────────────────────────────────────────────

/// The ministry a role belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ministry {
  Kids,
  Ushering,
}

impl Ministry {
  /// The roster this ministry takes attendance for.
  pub fn roster(self) -> SubjectKind {
    match self {
      Self::Kids => SubjectKind::Student,
      Self::Ushering => SubjectKind::Member,
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  SuperAdmin,
  /// Kids' ministry manager.
  Admin,
  Teacher,
  AssistantTeacher,
  UsherAdmin,
  Usher,
}

impl Role {
  /// The ministries this role serves.
  pub fn ministries(self) -> &'static [Ministry] {
    match self {
      Self::SuperAdmin => &[Ministry::Kids, Ministry::Ushering],
      Self::Admin | Self::Teacher | Self::AssistantTeacher => &[Ministry::Kids],
      Self::UsherAdmin | Self::Usher => &[Ministry::Ushering],
    }
  }

  pub fn serves(self, ministry: Ministry) -> bool {
    self.ministries().contains(&ministry)
  }

  pub fn can_take_attendance(self, kind: SubjectKind) -> bool {
    self
      .ministries()
      .iter()
      .any(|m| m.roster() == kind)
  }

  pub fn can_edit_subjects(self, kind: SubjectKind) -> bool {
    match kind {
      SubjectKind::Student => self.serves(Ministry::Kids),
      SubjectKind::Member => matches!(
        self,
        Self::SuperAdmin | Self::Admin | Self::UsherAdmin | Self::Usher
      ),
    }
  }

  pub fn can_delete_subjects(self, kind: SubjectKind) -> bool {
    match kind {
      SubjectKind::Student => matches!(self, Self::SuperAdmin | Self::Admin),
      SubjectKind::Member => {
        matches!(self, Self::SuperAdmin | Self::Admin | Self::UsherAdmin)
      }
    }
  }

  /// Open or close the attendance lock.
  pub fn can_toggle_lock(self) -> bool {
    matches!(self, Self::SuperAdmin | Self::Admin | Self::Teacher)
  }

  pub fn can_view_login_history(self) -> bool { self == Self::SuperAdmin }

  /// Whether this role may create or remove staff accounts with `target`.
  pub fn can_manage_staff(self, target: Role) -> bool {
    match self {
      Self::SuperAdmin => true,
      Self::Admin => {
        matches!(target, Self::Admin | Self::Teacher | Self::AssistantTeacher)
      }
      Self::UsherAdmin => target == Self::Usher,
      Self::Teacher | Self::AssistantTeacher | Self::Usher => false,
    }
  }

  /// Turn a predicate result into a [`Error::PermissionDenied`].
  pub fn require(allowed: bool, action: &'static str) -> Result<()> {
    if allowed {
      Ok(())
    } else {
      Err(Error::PermissionDenied(action))
    }
  }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// A staff account. Logs in with username and PIN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffUser {
  pub staff_id:   Uuid,
  pub username:   String,
  pub full_name:  String,
  pub role:       Role,
  /// argon2 PHC string of the PIN. Never leaves the server.
  #[serde(skip_serializing, default)]
  pub pin_hash:   String,
  pub created_at: DateTime<Utc>,
}

impl StaffUser {
  pub fn session(&self) -> Session {
    Session {
      staff_id:  self.staff_id,
      username:  self.username.clone(),
      full_name: self.full_name.clone(),
      role:      self.role,
    }
  }
}

/// Input to [`crate::store::AttendanceStore::add_staff`]. The PIN arrives
/// already hashed.
#[derive(Debug, Clone)]
pub struct NewStaff {
  pub username:  String,
  pub full_name: String,
  pub role:      Role,
  pub pin_hash:  String,
}

/// The authenticated caller, passed explicitly to every handler that needs
/// to make a permission decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub staff_id:  Uuid,
  pub username:  String,
  pub full_name: String,
  pub role:      Role,
}

/// One successful login, kept for the super admin's audit view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginEvent {
  pub login_id: Uuid,
  pub staff_id: Uuid,
  pub username: String,
  pub role:     Role,
  pub login_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn role_round_trips_through_strings() {
    for role in Role::iter() {
      let s = role.to_string();
      assert_eq!(s.parse::<Role>().unwrap(), role);
      assert_eq!(serde_json::to_string(&role).unwrap(), format!("\"{s}\""));
    }
    assert_eq!(Role::AssistantTeacher.to_string(), "ASSISTANT_TEACHER");
  }

  #[test]
  fn kids_attendance_is_kids_roles_only() {
    let allowed: Vec<Role> = Role::iter()
      .filter(|r| r.can_take_attendance(SubjectKind::Student))
      .collect();
    assert_eq!(
      allowed,
      vec![Role::SuperAdmin, Role::Admin, Role::Teacher, Role::AssistantTeacher]
    );
    assert!(Role::Usher.can_take_attendance(SubjectKind::Member));
    assert!(!Role::Teacher.can_take_attendance(SubjectKind::Member));
  }

  #[test]
  fn only_admins_delete_students() {
    let allowed: Vec<Role> = Role::iter()
      .filter(|r| r.can_delete_subjects(SubjectKind::Student))
      .collect();
    assert_eq!(allowed, vec![Role::SuperAdmin, Role::Admin]);
    assert!(Role::AssistantTeacher.can_edit_subjects(SubjectKind::Student));
    assert!(!Role::Usher.can_delete_subjects(SubjectKind::Member));
  }

  #[test]
  fn assistants_cannot_toggle_lock() {
    assert!(Role::Teacher.can_toggle_lock());
    assert!(!Role::AssistantTeacher.can_toggle_lock());
    assert!(!Role::Usher.can_toggle_lock());
  }

  #[test]
  fn staff_management_is_scoped() {
    assert!(Role::SuperAdmin.can_manage_staff(Role::SuperAdmin));
    assert!(Role::Admin.can_manage_staff(Role::Teacher));
    assert!(!Role::Admin.can_manage_staff(Role::SuperAdmin));
    assert!(!Role::Admin.can_manage_staff(Role::Usher));
    assert!(Role::UsherAdmin.can_manage_staff(Role::Usher));
    assert!(!Role::UsherAdmin.can_manage_staff(Role::UsherAdmin));
    assert!(!Role::Teacher.can_manage_staff(Role::AssistantTeacher));
  }

  #[test]
  fn require_maps_to_permission_denied() {
    assert!(Role::require(true, "x").is_ok());
    assert!(matches!(
      Role::require(false, "delete subjects"),
      Err(Error::PermissionDenied("delete subjects"))
    ));
  }

  #[test]
  fn pin_hash_is_never_serialized() {
    let user = StaffUser {
      staff_id:   Uuid::new_v4(),
      username:   "teacher".into(),
      full_name:  "Ms. Reyes".into(),
      role:       Role::Teacher,
      pin_hash:   "$argon2id$secret".into(),
      created_at: Utc::now(),
    };
    let json = serde_json::to_string(&user).unwrap();
    assert!(!json.contains("argon2"), "{json}");
  }
}
