//! `agora-content`: questions, answers and their edit payloads.

pub mod answer;
pub mod draft;
pub mod question;

pub use answer::Answer;
pub use draft::{AnswerDraft, QuestionDraft};
pub use question::Question;
