//! Password verification using Argon2id.
//!
//! Hashes are produced by the store on write; this module only checks
//! candidates against them.

use std::sync::LazyLock;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::AuthError;

/// Stand-in hash verified when the account or team does not exist, so
/// both failure paths cost one Argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"resman-absent-principal", &salt)
        .ok()
        .map(|hash| hash.to_string())
});

fn peppered_input<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> Result<bool, AuthError> {
    let mut buf = String::new();
    let input = peppered_input(password, pepper, &mut buf);

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// Check a credential pair where the principal may not exist.
///
/// Every failure, including a missing hash, is the same
/// [`AuthError::InvalidCredentials`].
pub fn verify_credentials(
    password: &str,
    hash: Option<&str>,
    pepper: Option<&str>,
) -> Result<(), AuthError> {
    match hash {
        Some(hash) => {
            if verify_password(password, hash, pepper)? {
                Ok(())
            } else {
                Err(AuthError::InvalidCredentials)
            }
        }
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, dummy, pepper);
            }
            Err(AuthError::InvalidCredentials)
        }
    }
}
