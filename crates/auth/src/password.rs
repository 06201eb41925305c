//! Password hashing (Argon2id, PHC string format).
//!
//! Raw passwords only ever pass through this module as `&str` and are never
//! stored, logged or returned.

use argon2::password_hash::{
    PasswordHash as PhcHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

use agora_core::{DomainError, DomainResult};

const SALT_LEN: usize = 16;
const MIN_PASSWORD_CHARS: usize = 8;
const MAX_PASSWORD_CHARS: usize = 1024;

/// A stored password hash in PHC string format (`$argon2id$v=19$...`).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a PHC string loaded from storage.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_phc(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashingCost {
    /// Cheapest parameters Argon2 accepts. Only meant for tests.
    pub const MINIMUM: Self = Self {
        memory_kib: Params::MIN_M_COST,
        iterations: Params::MIN_T_COST,
        parallelism: Params::MIN_P_COST,
    };
}

impl Default for HashingCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordHashError {
    #[error("invalid hashing parameters: {0}")]
    Params(String),

    #[error("salt generation failed: {0}")]
    Salt(String),

    #[error("hashing failed: {0}")]
    Hash(String),
}

impl From<PasswordHashError> for DomainError {
    fn from(value: PasswordHashError) -> Self {
        DomainError::persistence(value.to_string())
    }
}

/// Salted, slow one-way hashing of raw passwords.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(cost: HashingCost) -> Result<Self, PasswordHashError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordHashError::Params(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a raw password with a fresh random salt.
    pub fn hash(&self, raw_password: &str) -> Result<PasswordHash, PasswordHashError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordHashError::Salt(e.to_string()))?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordHashError::Salt(e.to_string()))?;

        let phc = self
            .argon2()
            .hash_password(raw_password.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::Hash(e.to_string()))?
            .to_string();
        Ok(PasswordHash(phc))
    }

    /// Check a raw password against a stored hash.
    ///
    /// Parameters are taken from the PHC string, so hashes produced under a
    /// different cost still verify. A malformed hash never verifies.
    pub fn verify(&self, hash: &PasswordHash, raw_password: &str) -> bool {
        match PhcHash::new(hash.as_phc()) {
            Ok(parsed) => self
                .argon2()
                .verify_password(raw_password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

/// Reject raw passwords that are too short or absurdly long.
pub fn validate_raw_password(raw_password: &str) -> DomainResult<()> {
    let chars = raw_password.chars().count();
    if chars < MIN_PASSWORD_CHARS {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    if chars > MAX_PASSWORD_CHARS {
        return Err(DomainError::validation(format!(
            "password must be at most {MAX_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}
