/// Password hashing using Argon2id
use crate::error::{AuthError, AuthResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher as _, PasswordVerifier as _,
};

/// One-way password hashing and verification.
///
/// Produces PHC-format Argon2id strings with a fresh random salt per call, so
/// two hashes of the same password never compare equal as strings; equality is
/// only meaningful through [`PasswordHasher::verify`].
pub struct PasswordHasher;

impl PasswordHasher {
    /// Hash a password for storage
    pub fn hash(password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash.
    ///
    /// A malformed stored hash fails verification rather than erroring; the
    /// comparison itself is the argon2 crate's constant-time check.
    pub fn verify(password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
