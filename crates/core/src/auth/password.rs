//! Account passwords: the length policy plus Argon2id hashing into PHC
//! strings.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Why a password could not be accepted, hashed or checked.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Argon2 rejected the input while hashing.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// Argon2 failed for a reason other than a mismatch.
    #[error("password check failed: {0}")]
    Verification(String),

    /// Stored value is not a PHC string.
    #[error("stored password hash is malformed")]
    MalformedHash,

    /// Password does not meet the length policy.
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    TooShort,
}

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Checks a new password against the policy.
///
/// # Errors
///
/// Returns `PasswordError::TooShort` below [`MIN_PASSWORD_LEN`] characters.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}

/// Hashes a password with Argon2id and a random salt, returning a PHC string.
///
/// # Errors
///
/// Returns `PasswordError::Hashing` if hashing fails.
///
/// ```
/// use spendbee_core::auth::hash_password;
///
/// let hash = hash_password("hunter22").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Checks `password` against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; only a malformed hash or an internal failure
/// is an error.
///
/// # Errors
///
/// Returns `PasswordError::MalformedHash` or `PasswordError::Verification`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let stored = PasswordHash::new(hash).map_err(|_| PasswordError::MalformedHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Verification(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("open-sesame").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("open-sesame", &hash).unwrap());
        assert!(!verify_password("open-sesame!", &hash).unwrap());
    }

    #[test]
    fn test_salt_differs_per_hash() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_password_length_policy() {
        assert!(matches!(
            validate_password_strength("12345"),
            Err(PasswordError::TooShort)
        ));
        assert!(validate_password_strength("123456").is_ok());
        // Counted in characters, not bytes
        assert!(validate_password_strength("ñññññ").is_err());
    }

    #[test]
    fn test_malformed_stored_hash() {
        let result = verify_password("password", "invalid_hash");
        assert!(matches!(result, Err(PasswordError::MalformedHash)));
    }
}
