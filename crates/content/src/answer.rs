use serde::Serialize;

use agora_core::{AnswerId, Entity, Owned, QuestionId, Timestamp, UserId};

use crate::draft::AnswerDraft;

/// An answer to a question.
///
/// Both `owner_id` and `question_id` are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub id: AnswerId,
    owner_id: UserId,
    question_id: QuestionId,
    pub content: String,
    pub created_on: Timestamp,
    pub updated_on: Timestamp,
}

impl Answer {
    pub fn new(
        owner_id: UserId,
        question_id: QuestionId,
        draft: AnswerDraft,
        now: Timestamp,
    ) -> Self {
        Self {
            id: AnswerId::new(),
            owner_id,
            question_id,
            content: draft.content,
            created_on: now,
            updated_on: now,
        }
    }

    /// Rebuild an answer from persisted columns.
    pub fn restore(
        id: AnswerId,
        owner_id: UserId,
        question_id: QuestionId,
        content: String,
        created_on: Timestamp,
        updated_on: Timestamp,
    ) -> Self {
        Self {
            id,
            owner_id,
            question_id,
            content,
            created_on,
            updated_on,
        }
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    pub fn apply_edit(&mut self, draft: AnswerDraft, now: Timestamp) {
        self.content = draft.content;
        self.updated_on = now.max(self.created_on);
    }
}

impl Entity for Answer {
    type Id = AnswerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Owned for Answer {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}
