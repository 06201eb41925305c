//! `agora-auth`: identity, credentials and the ownership gate.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! hash a password and how to decide ownership, not where users live.

pub mod authorize;
pub mod identity;
pub mod password;
pub mod session;
pub mod user;

pub use authorize::{is_owner, require_owner};
pub use identity::{Identity, Principal};
pub use password::{CredentialHasher, HashingCost, PasswordHash, PasswordHashError, validate_raw_password};
pub use session::{SessionContext, SessionToken};
pub use user::{User, Username};
