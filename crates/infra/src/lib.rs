//! Infrastructure layer: stores, identity and session services, the content
//! lifecycle engine and the action dispatcher.

pub mod forum;
pub mod identity;
pub mod lifecycle;
pub mod session;
pub mod store;


pub use forum::{Action, ActionOutcome, Forum};
pub use identity::IdentityStore;
pub use lifecycle::{AnswerView, ContentLifecycle, QuestionView, ThreadRemoval};
pub use session::SessionResolver;
