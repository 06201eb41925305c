//! User accounts.

use serde::{Deserialize, Serialize};

use agora_core::{DomainError, DomainResult, Entity, Timestamp, UserId};

use crate::password::PasswordHash;

const MAX_USERNAME_CHARS: usize = 64;

/// A validated, trimmed username.
///
/// Usernames are compared exactly (case-sensitive) and are unique across the
/// forum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if trimmed.chars().count() > MAX_USERNAME_CHARS {
            return Err(DomainError::validation(format!(
                "username must be at most {MAX_USERNAME_CHARS} characters"
            )));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("username cannot contain whitespace"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl core::fmt::Display for Username {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered user.
///
/// Serializing a `User` never emits the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    pub created_on: Timestamp,
    pub updated_on: Timestamp,
}

impl User {
    /// A user as it is first persisted: both timestamps equal.
    pub fn new(username: Username, password_hash: PasswordHash, now: Timestamp) -> Self {
        Self {
            id: UserId::new(),
            username,
            password_hash,
            created_on: now,
            updated_on: now,
        }
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
