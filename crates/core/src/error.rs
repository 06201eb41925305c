//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level outcome of a rejected operation.
///
/// Everything except [`DomainError::Persistence`] is a deterministic rejection:
/// retrying the same action against the same state yields the same answer.
/// `Persistence` wraps storage/transport faults and is the only retryable kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identity is required but the caller is anonymous.
    #[error("authentication required")]
    Unauthenticated,

    /// The caller is identified but does not own the target.
    #[error("forbidden")]
    Forbidden,

    /// A referenced entity does not exist.
    #[error("not found")]
    NotFound,

    /// The owner of a question attempted to answer it.
    #[error("answering your own question is not allowed")]
    SelfAnswerForbidden,

    /// Registration collided with an existing username.
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    /// Login with an unknown username or a wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// A payload failed validation (e.g. empty title).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Storage or transport fault.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn duplicate_username(username: impl Into<String>) -> Self {
        Self::DuplicateUsername(username.into())
    }

    /// Whether a caller may reasonably retry the same action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Stable machine-readable code, used by boundaries and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::SelfAnswerForbidden => "self_answer_forbidden",
            Self::DuplicateUsername(_) => "duplicate_username",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Validation(_) => "validation_error",
            Self::InvalidId(_) => "invalid_id",
            Self::Persistence(_) => "persistence_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_persistence_faults_are_retryable() {
        let rejections = [
            DomainError::Unauthenticated,
            DomainError::Forbidden,
            DomainError::NotFound,
            DomainError::SelfAnswerForbidden,
            DomainError::duplicate_username("alice"),
            DomainError::InvalidCredentials,
            DomainError::validation("empty title"),
            DomainError::invalid_id("nope"),
        ];
        for err in rejections {
            assert!(!err.is_retryable(), "{err:?} must not be retryable");
        }
        assert!(DomainError::persistence("connection reset").is_retryable());
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [
            DomainError::Unauthenticated.code(),
            DomainError::Forbidden.code(),
            DomainError::NotFound.code(),
            DomainError::SelfAnswerForbidden.code(),
            DomainError::duplicate_username("x").code(),
            DomainError::InvalidCredentials.code(),
            DomainError::validation("x").code(),
            DomainError::invalid_id("x").code(),
            DomainError::persistence("x").code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn duplicate_username_message_names_the_user() {
        let err = DomainError::duplicate_username("alice");
        assert_eq!(err.to_string(), "username 'alice' is already taken");
    }
}
