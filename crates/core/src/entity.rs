//! Entity traits: identity and ownership.

use chrono::{DateTime, SubsecRound, Utc};

use crate::id::UserId;

/// Creation/update instants are always recorded in UTC.
pub type Timestamp = DateTime<Utc>;

/// Current instant at microsecond precision, the resolution Postgres
/// `TIMESTAMPTZ` keeps. Entities stamped with it compare equal to their
/// stored rows.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Content that belongs to exactly one user.
///
/// The owner is fixed at creation. Implementors must never expose a way to
/// reassign it.
pub trait Owned: Entity {
    fn owner_id(&self) -> UserId;
}
