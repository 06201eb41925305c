//! The acting identity of a single action.

use serde::Serialize;

use agora_core::{DomainError, DomainResult, UserId};

use crate::user::{User, Username};

/// An authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: Username,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Resolved identity for the current action.
///
/// `Anonymous` is an ordinary value, not an error: callers branch on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl Identity {
    pub fn authenticated(user: &User) -> Self {
        Self::Authenticated(Principal::from(user))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(p) => Some(p),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.principal().map(|p| p.user_id)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The principal, or `Unauthenticated` for anonymous callers.
    pub fn require_authenticated(&self) -> DomainResult<&Principal> {
        self.principal().ok_or(DomainError::Unauthenticated)
    }
}
