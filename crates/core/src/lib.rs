//! `agora-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by every other crate:
//! identifiers, the ownership traits and the error taxonomy. No IO lives here.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, Owned, Timestamp, now};
pub use error::{DomainError, DomainResult};
pub use id::{AnswerId, QuestionId, UserId};
