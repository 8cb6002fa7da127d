//! Argon2 hashing for passwords and trading PINs

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use common::error::{Error, Result};
use uuid::Uuid;

/// Minimum password length in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a secret into an argon2 PHC string
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| Error::Internal(format!("failed to create salt: {e}")))?;
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| Error::Internal(format!("argon2 hash failed: {e}")))?
        .to_string();
    Ok(hash)
}

/// Check a candidate secret against a stored PHC string.
/// Unparseable hashes never verify.
pub fn verify_secret(stored: &str, candidate: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// A PIN is 4 to 6 ASCII digits
pub fn validate_pin(pin: &str) -> Result<()> {
    if !(4..=6).contains(&pin.len()) || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::ValidationError("PIN must be 4 to 6 digits".to_string()));
    }
    Ok(())
}
