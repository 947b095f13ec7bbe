//! Password hashing and verification (Argon2id, PHC strings).

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to hash password: {0}")]
pub struct PasswordHashError(String);

/// Hash a password with a fresh random salt. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordHashError(e.to_string()))
}

/// Check a password against a stored PHC string.
///
/// A stored value that is not a parseable hash never matches; there is no
/// plaintext comparison fallback.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("stored credential is not a valid password hash: {e}");
            false
        }
    }
}

/// Run a verification that cannot succeed, for lookups that found no stored
/// hash. Keeps the failure path as slow as a wrong password.
pub fn verify_absent(password: &str) -> bool {
    static ABSENT: OnceLock<Option<String>> = OnceLock::new();
    if let Some(hash) = ABSENT.get_or_init(|| hash_password("smartquota:absent-account").ok()) {
        verify_password(password, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("s3nh4").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3nh4", &hash));
        assert!(!verify_password("outra", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("x").unwrap(), hash_password("x").unwrap());
    }

    #[test]
    fn absent_accounts_never_verify() {
        assert!(!verify_absent("smartquota:absent-account"));
        assert!(!verify_absent(""));
    }

    #[test]
    fn plaintext_stored_values_never_match() {
        assert!(!verify_password("s3nh4", "s3nh4"));
    }
}
