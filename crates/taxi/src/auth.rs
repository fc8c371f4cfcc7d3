//! Password hashing and the authenticated principal.
//!
//! Passwords are stored as Argon2id PHC strings. Every operation that touches
//! fleet records takes an `Option<&Principal>` and refuses to run without one.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Driver;

/// The driver on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Id of the authenticated driver.
    pub driver_id: i64,
    /// Username of the authenticated driver.
    pub username: String,
}

impl From<&Driver> for Principal {
    fn from(driver: &Driver) -> Self {
        Self {
            driver_id: driver.id,
            username: driver.username.clone(),
        }
    }
}

/// Return the principal, or [`Error::Unauthenticated`] if there is none.
///
/// # Errors
///
/// Returns [`Error::Unauthenticated`] when `principal` is `None`.
pub fn require_principal(principal: Option<&Principal>) -> Result<&Principal> {
    principal.ok_or(Error::Unauthenticated)
}

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns [`Error::PasswordHash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash string.
///
/// Returns `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns [`Error::PasswordHash`] if the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::PasswordHash(e.to_string())),
    }
}
