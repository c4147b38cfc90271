//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so parameters and salt travel with the
//! hash and can be tuned later without invalidating existing accounts.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version};
use once_cell::sync::Lazy;

use super::AuthError;

/// Argon2id hasher with OWASP recommended parameters (19 MiB, 2 passes, 1 lane).
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Result<Self, AuthError> {
        let params = Params::new(19456, 2, 1, None).map_err(|e| {
            tracing::error!("Failed to create Argon2 parameters: {}", e);
            AuthError::PasswordHash(e.to_string())
        })?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                tracing::error!("Password hashing failed: {}", e);
                AuthError::PasswordHash(e.to_string())
            })
    }

    /// Constant-time verification. A stored hash that does not parse never matches.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                return false;
            }
        };

        self.argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    }
}

/// Convenience wrapper used by services and the CLI.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    PasswordHasher::new()?.hash_password(password)
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHasher::new() {
        Ok(hasher) => hasher.verify_password(password, stored_hash),
        Err(_) => false,
    }
}

/// Hash of a random secret nobody knows, verified against when an account
/// does not exist so unknown and known emails cost the same.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password(SaltString::generate(&mut OsRng).as_str()).ok());

/// Full Argon2 verification that never succeeds.
pub fn verify_against_dummy(password: &str) -> bool {
    match DUMMY_HASH.as_deref() {
        Some(hash) => {
            verify_password(password, hash);
            false
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = PasswordHasher::new().unwrap();
        let hash = hasher.hash_password("admin123!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("admin123!", &hash));
        assert!(!hasher.verify_password("admin124!", &hash));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn dummy_verification_runs_argon2_and_fails() {
        assert!(DUMMY_HASH.as_deref().is_some_and(|h| h.starts_with("$argon2id$")));
        assert!(!verify_against_dummy("admin123"));
        assert!(!verify_against_dummy(""));
    }
}
