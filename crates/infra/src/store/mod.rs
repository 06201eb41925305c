//! Storage ports and adapters for users, content and sessions.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{
    DEFAULT_SESSION_TTL, InMemoryContentStore, InMemorySessionStore, InMemoryUserRepository,
};
pub use postgres::PostgresStore;
pub use r#trait::{ContentStore, SessionStore, StoreError, UserRepository};
