//! Password hashing and verification
//!
//! New hashes are Argon2id (PHC string format, random salt per call).
//! Hashes imported from the previous system are bcrypt (`$2a$`/`$2b$`/`$2y$`)
//! and are still accepted for verification.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use thiserror::Error;
use tracing::{error, warn};

/// Errors raised while hashing a password
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hash a plaintext password with a fresh random salt
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a plaintext password against a stored hash.
///
/// Fails closed: a malformed or unknown hash format yields `false`.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    if stored_hash.starts_with("$2") {
        return bcrypt::verify(plaintext, stored_hash).unwrap_or_else(|e| {
            warn!("Unreadable bcrypt hash: {}", e);
            false
        });
    }

    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Unreadable password hash: {}", e);
            false
        }
    }
}

/// [`hash_password`] on the blocking pool
pub async fn hash_password_blocking(plaintext: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext)).await?
}

/// [`verify_password`] on the blocking pool; a failed task counts as a mismatch
pub async fn verify_password_blocking(plaintext: String, stored_hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&plaintext, &stored_hash))
        .await
        .unwrap_or_else(|e| {
            error!("Password verification task failed: {}", e);
            false
        })
}
