//! Validated create/edit payloads.
//!
//! A draft can only be built through its constructor, so holding one means
//! the text already passed validation.

use serde::Serialize;

use agora_core::{DomainError, DomainResult};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_BODY_CHARS: usize = 20_000;

fn required(field: &str, raw: &str, max: usize) -> DomainResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Title and body of a question (create or full replacement).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionDraft {
    pub(crate) title: String,
    pub(crate) content: String,
}

impl QuestionDraft {
    pub fn new(title: &str, content: &str) -> DomainResult<Self> {
        Ok(Self {
            title: required("title", title, MAX_TITLE_CHARS)?,
            content: required("content", content, MAX_BODY_CHARS)?,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Body of an answer (create or full replacement).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerDraft {
    pub(crate) content: String,
}

impl AnswerDraft {
    pub fn new(content: &str) -> DomainResult<Self> {
        Ok(Self {
            content: required("content", content, MAX_BODY_CHARS)?,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
