//! Ownership gate.
//!
//! - No IO
//! - No panics
//! - One rule: the acting identity must be the content's owner

use agora_core::{DomainError, DomainResult, Owned};

use crate::identity::Identity;

/// True iff `identity` is authenticated and owns `content`.
///
/// Anonymous identities own nothing.
pub fn is_owner<C>(identity: &Identity, content: &C) -> bool
where
    C: Owned + ?Sized,
{
    identity
        .user_id()
        .is_some_and(|user_id| user_id == content.owner_id())
}

/// `Forbidden` unless [`is_owner`] holds.
pub fn require_owner<C>(identity: &Identity, content: &C) -> DomainResult<()>
where
    C: Owned + ?Sized,
{
    if is_owner(identity, content) {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}
