//! HTTP Basic-auth (`username:PIN`) extractor and PIN hashing.
//!
//! PINs are stored as argon2 PHC strings and checked on every request.

use std::sync::LazyLock;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use rollcall_core::{
  staff::{Session, StaffUser},
  store::AttendanceStore,
};

use crate::{AppState, error::ApiError};

/// Shortest and longest PIN accepted.
pub const PIN_LENGTH: std::ops::RangeInclusive<usize> = 4..=6;

/// Reject anything but 4 to 6 ASCII digits.
pub fn validate_pin(pin: &str) -> Result<(), ApiError> {
  if PIN_LENGTH.contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit()) {
    Ok(())
  } else {
    Err(ApiError::BadRequest("PIN must be 4 to 6 digits".into()))
  }
}

/// Hash a PIN into an argon2 PHC string.
pub fn hash_pin(pin: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(pin.as_bytes(), &salt)?.to_string())
}

pub fn verify_pin(pin: &str, pin_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(pin_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(pin.as_bytes(), &parsed)
    .is_ok()
}

/// Decode an `Authorization: Basic` header into `(username, pin)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let encoded = headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (username, pin) = creds.split_once(':')?;
  Some((username.to_owned(), pin.to_owned()))
}

/// Hash checked for unknown usernames, so every failed login costs one
/// argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash_pin("000000").ok());

/// Look `username` up and check `pin` against its hash.
pub async fn check_credentials<S>(
  store: &S,
  username: &str,
  pin: &str,
) -> Result<StaffUser, ApiError>
where
  S: AttendanceStore,
{
  let Some(user) = store.find_staff(username).await.map_err(ApiError::store)? else {
    verify_pin(pin, DUMMY_HASH.as_deref().unwrap_or_default());
    tracing::debug!(%username, "unknown username");
    return Err(ApiError::Unauthorized);
  };
  if !verify_pin(pin, &user.pin_hash) {
    tracing::debug!(%username, "rejected PIN");
    return Err(ApiError::Unauthorized);
  }
  Ok(user)
}

/// The caller's session, resolved from Basic credentials.
pub struct Authenticated(pub Session);

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: AttendanceStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (username, pin) =
      basic_credentials(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let user = check_credentials(state.store.as_ref(), &username, &pin).await?;
    Ok(Authenticated(user.session()))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn pin_hash_verifies_only_the_same_pin() {
    let hash = hash_pin("1234").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_pin("1234", &hash));
    assert!(!verify_pin("4321", &hash));
    assert!(!verify_pin("1234", "not a phc string"));
  }

  #[test]
  fn unknown_usernames_still_pay_for_a_verification() {
    let dummy = DUMMY_HASH.as_deref().unwrap();
    assert!(PasswordHash::new(dummy).is_ok());
    assert!(!verify_pin("1234", dummy));
  }

  #[test]
  fn pin_shape() {
    assert!(validate_pin("1234").is_ok());
    assert!(validate_pin("123456").is_ok());
    assert!(validate_pin("123").is_err());
    assert!(validate_pin("1234567").is_err());
    assert!(validate_pin("12a4").is_err());
  }

  #[test]
  fn basic_header_parsing() {
    let value = format!("Basic {}", B64.encode("teacher:1111"));
    assert_eq!(
      basic_credentials(&headers(&value)),
      Some(("teacher".into(), "1111".into()))
    );
    assert_eq!(basic_credentials(&headers("Basic !!!not-base64!!!")), None);
    assert_eq!(basic_credentials(&headers("Bearer abc")), None);
    assert_eq!(basic_credentials(&HeaderMap::new()), None);
  }
}
