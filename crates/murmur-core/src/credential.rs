//! Password hashing. The stored form is an Argon2id PHC string.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use rand_core::OsRng;

use crate::{Error, Result};

pub fn hash_password(plain: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(plain.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Credential(e.to_string()))
}

/// `Ok(false)` on mismatch; a stored hash that does not parse is an error.
pub fn verify_password(plain: &str, phc: &str) -> Result<bool> {
  let parsed = PasswordHash::new(phc).map_err(|e| Error::Credential(e.to_string()))?;
  match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(password_hash::Error::Password) => Ok(false),
    Err(e) => Err(Error::Credential(e.to_string())),
  }
}
