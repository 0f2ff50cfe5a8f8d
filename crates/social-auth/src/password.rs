//! Password generation and hashing for provisioned accounts.
//!
//! Accounts created through social login never authenticate with a
//! password, but the account still needs one. A random password is generated
//! and only its Argon2id hash is stored.
//!
//! # Example
//!
//! ```
//! use social_auth::password::{PasswordGenerator, RandomPasswordGenerator, hash_password, verify_password};
//!
//! let password = RandomPasswordGenerator.generate(32);
//! assert_eq!(password.len(), 32);
//!
//! let hash = hash_password(&password).unwrap();
//! assert!(verify_password(&password, &hash).unwrap());
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::{AuthError, AuthResult};

/// Length of generated passwords.
pub const GENERATED_PASSWORD_LENGTH: usize = 32;

/// Source of random passwords for new accounts.
pub trait PasswordGenerator: Send + Sync {
    /// Generate a password of `length` characters.
    fn generate(&self, length: usize) -> String;

    /// Hash a generated password for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    fn hash(&self, password: &str) -> AuthResult<String> {
        hash_password(password)
            .map_err(|e| AuthError::internal(format!("Failed to hash password: {e}")))
    }
}

/// Generates alphanumeric passwords from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPasswordGenerator;

impl PasswordGenerator for RandomPasswordGenerator {
    fn generate(&self, length: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}

/// Hash a password for storage using Argon2id.
///
/// Returns a PHC-formatted hash string.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// # Errors
///
/// Returns `Err` only if the hash format is invalid.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}
