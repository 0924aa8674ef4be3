//! 管理员密码哈希
//!
//! `api.admin_password` holds an Argon2id PHC string produced by
//! `mflix hash-password`; login compares against it.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

#[derive(Debug)]
pub enum PasswordError {
    HashError(String),
    VerifyError(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HashError(msg) => write!(f, "Password hash error: {}", msg),
            Self::VerifyError(msg) => write!(f, "Password verify error: {}", msg),
        }
    }
}

impl std::error::Error for PasswordError {}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::HashError("password cannot be empty".into()));
    }
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// A malformed stored hash is an error, a wrong password is `Ok(false)`
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::VerifyError(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn is_argon2_hash(s: &str) -> bool {
    s.starts_with("$argon2")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("popcorn-2024").expect("hash should succeed");

        assert!(is_argon2_hash(&hash));
        assert!(verify_password("popcorn-2024", &hash).expect("verify should succeed"));
        assert!(!verify_password("popcorn", &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(hash_password("").is_err());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("x", "plaintext").is_err());
        assert!(!is_argon2_hash("$bcrypt$xxx"));
    }
}
