//! Password hashing - the one-way adaptive hash behind every stored password.
//!
//! Hashes are self-describing (`$2b$10$...`, `$argon2id$v=19$...`): the
//! algorithm, cost and salt travel inside the string, so verification never
//! needs anything but the plaintext and the stored hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::{DEFAULT_HASH_COST, MAX_BCRYPT_PASSWORD_BYTES};
use crate::errors::{AppError, AppResult};

/// Hashing primitive used by the pre-persist hook.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash of `plain_text`.
    fn hash(&self, plain_text: &str) -> AppResult<String>;

    /// Check `plain_text` against a previously produced hash.
    fn verify(&self, plain_text: &str, hashed: &str) -> bool;
}

/// Hash a password with bcrypt at the given cost
/// ([`DEFAULT_HASH_COST`] unless configured otherwise).
///
/// # Errors
/// Returns [`AppError::Validation`] for passwords longer than
/// [`MAX_BCRYPT_PASSWORD_BYTES`], which bcrypt would silently truncate.
/// Returns [`AppError::Hashing`] if the cost is outside the range bcrypt
/// accepts or the primitive fails.
pub fn hash_password(plain_text: &str, cost: u32) -> AppResult<String> {
    if plain_text.len() > MAX_BCRYPT_PASSWORD_BYTES {
        return Err(AppError::validation(format!(
            "password must be at most {} bytes",
            MAX_BCRYPT_PASSWORD_BYTES
        )));
    }

    bcrypt::hash(plain_text, cost).map_err(|e| AppError::hashing(e.to_string()))
}

/// Verify a password against any hash this crate can produce.
///
/// The algorithm is read from the hash identifier; digest comparison is left
/// to the primitive, which compares in constant time. Malformed hashes never
/// match.
pub fn verify_password(plain_text: &str, hashed: &str) -> bool {
    if hashed.starts_with("$argon2") {
        return verify_argon2(plain_text, hashed);
    }

    match bcrypt::verify(plain_text, hashed) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable password hash");
            false
        }
    }
}

fn verify_argon2(plain_text: &str, hashed: &str) -> bool {
    let parsed = match PasswordHash::new(hashed) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable password hash");
            return false;
        }
    };

    // Params come from the hash itself, not from this instance.
    Argon2::default()
        .verify_password(plain_text.as_bytes(), &parsed)
        .is_ok()
}

/// Bcrypt hasher; `cost` is the log2 round count.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain_text: &str) -> AppResult<String> {
        hash_password(plain_text, self.cost)
    }

    fn verify(&self, plain_text: &str, hashed: &str) -> bool {
        verify_password(plain_text, hashed)
    }
}

/// Argon2id hasher; `cost` is the time cost (iterations). Memory and
/// parallelism stay at the library defaults.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Hasher {
    cost: u32,
}

impl Argon2Hasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    #[inline]
    fn argon2(&self) -> AppResult<Argon2<'static>> {
        let params = Params::new(Params::DEFAULT_M_COST, self.cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| AppError::hashing(format!("invalid argon2 parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plain_text: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plain_text: &str, hashed: &str) -> bool {
        verify_password(plain_text, hashed)
    }
}
