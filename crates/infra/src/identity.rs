//! Identity store: user registration, lookup and credential checks.
//!
//! Argon2 is deliberately slow, so hashing and verification run on tokio's
//! blocking pool rather than on the async workers.

use tracing::{debug, info, instrument, warn};

use agora_auth::{CredentialHasher, PasswordHash, User, Username, validate_raw_password};
use agora_core::{DomainError, DomainResult, UserId, now};

use crate::store::{StoreError, UserRepository};

/// Registration, lookup and authentication over a [`UserRepository`].
#[derive(Debug, Clone)]
pub struct IdentityStore<R> {
    users: R,
    hasher: CredentialHasher,
}

impl<R> IdentityStore<R>
where
    R: UserRepository,
{
    pub fn new(users: R, hasher: CredentialHasher) -> Self {
        Self { users, hasher }
    }

    pub fn repository(&self) -> &R {
        &self.users
    }

    /// Create an account. The password is hashed before anything is stored.
    #[instrument(skip(self, raw_password))]
    pub async fn register(&self, username: &str, raw_password: &str) -> DomainResult<User> {
        let username = Username::parse(username)?;
        validate_raw_password(raw_password)?;

        let password_hash = self.hash_password(raw_password).await?;
        let user = User::new(username, password_hash, now());

        match self.users.insert_user(&user).await {
            Ok(()) => {
                info!(user_id = %user.id, username = %user.username, "user registered");
                Ok(user)
            }
            Err(StoreError::UniqueViolation(_)) => {
                debug!(username = %user.username, "registration rejected: username taken");
                Err(DomainError::duplicate_username(user.username.as_str()))
            }
            Err(e) => {
                warn!(error = %e, "registration failed in storage");
                Err(e.into())
            }
        }
    }

    pub async fn find_by_username(&self, username: &Username) -> DomainResult<User> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn find_by_id(&self, id: UserId) -> DomainResult<User> {
        self.users.find_by_id(id).await?.ok_or(DomainError::NotFound)
    }

    /// True only for the exact password the hash was made from.
    pub async fn verify_password(&self, user: &User, raw_password: &str) -> DomainResult<bool> {
        let hasher = self.hasher.clone();
        let hash = user.password_hash.clone();
        let raw = raw_password.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &raw))
            .await
            .map_err(|e| DomainError::persistence(format!("password verification task failed: {e}")))
    }

    /// Resolve a login attempt.
    ///
    /// An unknown username and a wrong password are the same failure.
    #[instrument(skip(self, raw_password))]
    pub async fn authenticate(&self, username: &str, raw_password: &str) -> DomainResult<User> {
        let Ok(username) = Username::parse(username) else {
            return Err(DomainError::InvalidCredentials);
        };

        let user = match self.find_by_username(&username).await {
            Ok(user) => user,
            Err(DomainError::NotFound) => {
                debug!(%username, "login rejected: unknown username");
                return Err(DomainError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if self.verify_password(&user, raw_password).await? {
            info!(user_id = %user.id, "user authenticated");
            Ok(user)
        } else {
            debug!(user_id = %user.id, "login rejected: wrong password");
            Err(DomainError::InvalidCredentials)
        }
    }

    async fn hash_password(&self, raw_password: &str) -> DomainResult<PasswordHash> {
        let hasher = self.hasher.clone();
        let raw = raw_password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&raw))
            .await
            .map_err(|e| DomainError::persistence(format!("password hashing task failed: {e}")))?;
        Ok(hashed?)
    }
}
