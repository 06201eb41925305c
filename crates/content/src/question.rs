use serde::Serialize;

use agora_core::{Entity, Owned, QuestionId, Timestamp, UserId};

use crate::draft::QuestionDraft;

/// A question posted by a user.
///
/// `owner_id` is set once by [`Question::new`] and is not writable from
/// outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    owner_id: UserId,
    pub title: String,
    pub content: String,
    pub created_on: Timestamp,
    pub updated_on: Timestamp,
}

impl Question {
    pub fn new(owner_id: UserId, draft: QuestionDraft, now: Timestamp) -> Self {
        Self {
            id: QuestionId::new(),
            owner_id,
            title: draft.title,
            content: draft.content,
            created_on: now,
            updated_on: now,
        }
    }

    /// Rebuild a question from persisted columns.
    pub fn restore(
        id: QuestionId,
        owner_id: UserId,
        title: String,
        content: String,
        created_on: Timestamp,
        updated_on: Timestamp,
    ) -> Self {
        Self {
            id,
            owner_id,
            title,
            content,
            created_on,
            updated_on,
        }
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Replace title and content; ownership and creation time are untouched.
    pub fn apply_edit(&mut self, draft: QuestionDraft, now: Timestamp) {
        self.title = draft.title;
        self.content = draft.content;
        self.updated_on = now.max(self.created_on);
    }
}

impl Entity for Question {
    type Id = QuestionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Owned for Question {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}
