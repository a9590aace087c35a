//! Password hashing for the account endpoints.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::GatewayError;

/// Hashes a password with Argon2id and a fresh random salt, returning the
/// PHC-format hash string stored in the user record.
///
/// # Errors
///
/// Returns [`GatewayError::Internal`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, GatewayError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GatewayError::Internal(format!("password hashing failed: {e}")))
}

/// Verifies a password against a stored PHC-format hash.
///
/// Unparseable hashes verify as `false` rather than erroring, so a
/// corrupted record behaves like a wrong password.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
