//! Cryptographic functions for the user system
//!
//! Provides:
//! - Argon2id password hashing
//! - Random single-use account tokens, stored only as their SHA-256 digest

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::errors::UserError;
use crate::Result;

/// Random bytes in an account token.
pub const TOKEN_BYTES: usize = 32;

/// Hash a password using Argon2id.
///
/// # Returns
/// The PHC string (algorithm, parameters, salt and hash).
pub fn hash_password(password: impl AsRef<str>) -> Result<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    Argon2::default()
        .hash_password(password.as_ref().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            UserError::HashingFailed {
                reason: e.to_string(),
            }
            .into()
        })
}

/// Verify a password against its PHC hash.
///
/// # Errors
/// * [`UserError::InvalidCredentials`] on mismatch or an unparsable hash
pub fn verify_password(password: impl AsRef<str>, password_hash: impl AsRef<str>) -> Result<()> {
    let parsed_hash =
        PasswordHash::new(password_hash.as_ref()).map_err(|_| UserError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_ref().as_bytes(), &parsed_hash)
        .map_err(|_| UserError::InvalidCredentials.into())
}

/// Generate a random URL-safe account token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest under which an account token is stored.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
