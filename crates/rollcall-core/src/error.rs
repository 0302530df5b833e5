//! Error types for `rollcall-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  /// Verse and remark flags only make sense on an existing presence record.
  #[error("subject {0} is not marked present")]
  NotPresent(Uuid),

  #[error("attendance is locked")]
  AttendanceLocked,

  #[error("permission denied: {0}")]
  PermissionDenied(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
