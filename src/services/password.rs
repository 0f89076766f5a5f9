// src/services/password.rs
// DOCUMENTATION: Password hashing helpers
// PURPOSE: Argon2 PHC strings for stored credentials

use crate::errors::AppError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;

#[cfg(test)]
thread_local! {
    static VERIFY_CALLS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Number of Argon2 verifications run on the current thread
#[cfg(test)]
pub fn verify_calls() -> usize {
    VERIFY_CALLS.with(|calls| calls.get())
}

/// Hash a plain password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalError(format!("Failed to hash password: {}", e)))?
        .to_string();
    Ok(hash)
}

/// Check a plain password against a stored hash
/// DOCUMENTATION: Comparison is constant-time; an unparsable stored hash is an error
pub fn verify_password(hash: &str, password: &str) -> Result<bool, AppError> {
    #[cfg(test)]
    VERIFY_CALLS.with(|calls| calls.set(calls.get() + 1));

    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::InternalError(format!("Stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Run a full verification against a throwaway hash and discard the result
/// DOCUMENTATION: Lets a lookup miss cost the same Argon2 work as a wrong password
pub fn verify_dummy_password(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let hash = DUMMY_HASH.get_or_init(|| hash_password("dummy-password").ok());
    if let Some(hash) = hash {
        let _ = verify_password(hash, password);
    }
}
