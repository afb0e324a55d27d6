//! Password hashing with Argon2
//!
//! New hashes are always Argon2id. Hashes in bcrypt format (`$2a$`, `$2b$`,
//! `$2y$`) are still accepted on verify so accounts imported from the legacy
//! store can sign in.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

use qrest_shared::constants::MAX_PASSWORD_LENGTH;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hash error: {0}")]
    HashError(String),
    #[error("Password too long")]
    TooLong,
}

pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        // Counted in characters, the same unit the request validators use
        if password.chars().count() > MAX_PASSWORD_LENGTH {
            return Err(PasswordError::TooLong);
        }
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        if is_bcrypt_hash(hash) {
            return bcrypt::verify(password, hash)
                .map_err(|e| PasswordError::HashError(e.to_string()));
        }

        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// True when the stored hash should be replaced by an Argon2 hash.
    pub fn needs_rehash(hash: &str) -> bool {
        is_bcrypt_hash(hash)
    }
}

fn is_bcrypt_hash(hash: &str) -> bool {
    hash.starts_with("$2a$") || hash.starts_with("$2b$") || hash.starts_with("$2y$")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordService::hash("Password123!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(PasswordService::verify("Password123!", &hash).unwrap());
        assert!(!PasswordService::verify("wrong", &hash).unwrap());
        assert!(!PasswordService::needs_rehash(&hash));
    }

    #[test]
    fn test_verify_legacy_bcrypt() {
        let legacy = bcrypt::hash("Password123!", 4).unwrap();
        assert!(PasswordService::verify("Password123!", &legacy).unwrap());
        assert!(!PasswordService::verify("nope", &legacy).unwrap());
        assert!(PasswordService::needs_rehash(&legacy));
    }

    #[test]
    fn test_garbage_hash_is_error() {
        assert!(PasswordService::verify("x", "not-a-hash").is_err());
    }

    #[test]
    fn test_too_long() {
        let long = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(PasswordService::hash(&long), Err(PasswordError::TooLong)));
    }

    #[test]
    fn test_multibyte_length_counts_characters() {
        // 100 characters, 200 bytes
        let turkish = "ş".repeat(100);
        let hash = PasswordService::hash(&turkish).unwrap();
        assert!(PasswordService::verify(&turkish, &hash).unwrap());

        let too_long = "ş".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(PasswordService::hash(&too_long), Err(PasswordError::TooLong)));
    }
}
