//! Argon2id password hashing and verification.
//!
//! Hashes are stored as PHC strings so algorithm parameters and salt travel
//! with the hash.

use std::sync::LazyLock;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use herald_common::error::AppError;

/// Hash checked when the username is unknown, so that path costs the same
/// Argon2 work as a real one.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("herald-unknown-user").ok());

/// Hash a plaintext password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// [`verify_password`] on the blocking pool, so request workers are not stalled.
///
/// An unusable stored hash is logged and counts as a failed check.
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, AppError> {
    let result = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

    match result {
        Ok(valid) => Ok(valid),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is unusable");
            Ok(false)
        }
    }
}

/// Verify `password` against a throwaway hash. Always a failed check.
pub async fn verify_dummy_password(password: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || {
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = verify_password(&password, hash);
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

    Ok(false)
}
