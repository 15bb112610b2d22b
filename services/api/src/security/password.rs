//! services/api/src/security/password.rs
//!
//! Password hashing and verification. New hashes are Argon2; bcrypt hashes
//! (`$2a$`, `$2b$`, `$2y$`) from imported databases still verify.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

pub use argon2::password_hash::Error as PasswordError;

/// Hashes a password with a fresh random salt.
///
/// Returns the PHC-formatted hash string that includes the salt and parameters.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

fn is_bcrypt(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"].iter().any(|prefix| hash.starts_with(prefix))
}

/// Checks a password against a stored hash. Fails only when the stored hash
/// itself is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    if is_bcrypt(hash) {
        return bcrypt::verify(password, hash).map_err(|_| PasswordError::PhcStringField);
    }
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("password124", &hash).unwrap());
    }

    #[test]
    fn salts_differ_per_hash() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("password123", "plaintext").is_err());
        assert!(verify_password("password123", "$2b$12$truncated").is_err());
    }

    #[test]
    fn bcrypt_hashes_still_verify() {
        let legacy = bcrypt::hash("password123", 4).unwrap();
        assert!(legacy.starts_with("$2b$"));
        assert!(verify_password("password123", &legacy).unwrap());
        assert!(!verify_password("password124", &legacy).unwrap());
    }
}
