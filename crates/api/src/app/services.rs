//! Store and forum wiring.
//!
//! `DATABASE_URL` set: users and content live in Postgres. Unset: everything
//! is in memory (dev/test). Sessions are always in memory, with the
//! configured lifetime.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use agora_auth::{CredentialHasher, PasswordHashError};
use agora_infra::Forum;
use agora_infra::store::{
    ContentStore, InMemoryContentStore, InMemorySessionStore, InMemoryUserRepository,
    PostgresStore, SessionStore, StoreError, UserRepository,
};

use crate::config::AppConfig;

/// The forum as wired for the HTTP boundary, with type-erased stores.
pub type AppForum = Forum<Arc<dyn UserRepository>, Arc<dyn ContentStore>, Arc<dyn SessionStore>>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("password hasher: {0}")]
    Hasher(#[from] PasswordHashError),

    #[error("failed to connect to Postgres: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("failed to prepare schema: {0}")]
    Schema(#[from] StoreError),
}

pub async fn build_services(config: &AppConfig) -> Result<AppForum, ServiceError> {
    let hasher = CredentialHasher::new(config.hashing)?;
    let sessions: Arc<dyn SessionStore> =
        Arc::new(InMemorySessionStore::with_ttl(config.session_ttl));

    match &config.database_url {
        Some(url) => build_persistent_services(url, hasher, sessions).await,
        None => Ok(build_in_memory_services(hasher, sessions)),
    }
}

fn build_in_memory_services(hasher: CredentialHasher, sessions: Arc<dyn SessionStore>) -> AppForum {
    info!("using in-memory stores");
    let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
    let content: Arc<dyn ContentStore> = Arc::new(InMemoryContentStore::new());
    Forum::new(users, content, sessions, hasher)
}

async fn build_persistent_services(
    database_url: &str,
    hasher: CredentialHasher,
    sessions: Arc<dyn SessionStore>,
) -> Result<AppForum, ServiceError> {
    let pool = PgPool::connect(database_url).await?;
    let store = Arc::new(PostgresStore::new(pool));
    store.ensure_schema().await?;
    info!("using Postgres stores");

    let users: Arc<dyn UserRepository> = store.clone();
    let content: Arc<dyn ContentStore> = store;
    Ok(Forum::new(users, content, sessions, hasher))
}
