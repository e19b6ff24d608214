//! Password hashing and credential checks.
//!
//! Stored passwords have the form `sha256$<salt>$<hex digest>` where the
//! digest covers `<salt>:<password>`. Values without that prefix are legacy
//! plaintext entries and are compared as-is.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{User, UserProfile};
use crate::validation::same_email;

const SCHEME: &str = "sha256";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Same message whether the email or the password was wrong.
    #[error("Email ou mot de passe incorrect")]
    InvalidCredentials,
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{}${}${}", SCHEME, salt, digest(&salt, password))
}

/// Check `password` against a stored value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match parse_stored(stored) {
        Some((salt, expected)) => constant_time_eq(digest(salt, password).as_bytes(), expected.as_bytes()),
        None => constant_time_eq(password.as_bytes(), stored.as_bytes()),
    }
}

/// Whether `stored` is a legacy plaintext value.
pub fn is_legacy_plaintext(stored: &str) -> bool {
    parse_stored(stored).is_none()
}

/// Find the user matching both email (case-insensitive) and password.
pub fn authenticate(users: &[User], email: &str, password: &str) -> Result<UserProfile, AuthError> {
    users
        .iter()
        .find(|user| same_email(&user.email, email) && verify_password(password, &user.password_hash))
        .map(UserProfile::from)
        .ok_or(AuthError::InvalidCredentials)
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn parse_stored(stored: &str) -> Option<(&str, &str)> {
    let rest = stored.strip_prefix(SCHEME)?.strip_prefix('$')?;
    let (salt, hash) = rest.split_once('$')?;
    if salt.is_empty() || hash.len() != 64 {
        return None;
    }
    Some((salt, hash))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
