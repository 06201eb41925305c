use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use agora_auth::{SessionToken, User, Username};
use agora_content::{Answer, AnswerDraft, Question, QuestionDraft};
use agora_core::{AnswerId, DomainError, QuestionId, UserId};

/// Store operation error.
///
/// These are **infrastructure errors**. Services translate them into the
/// domain taxonomy; only `NotFound`/`ParentNotFound` carry domain meaning on
/// their own.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("parent question not found")]
    ParentNotFound,

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("entity still has dependents: {0}")]
    HasDependents(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound | StoreError::ParentNotFound => DomainError::NotFound,
            other => DomainError::persistence(other.to_string()),
        }
    }
}

/// Persistence port for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. A taken username fails with `UniqueViolation` and
    /// leaves the existing row untouched.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
}

/// Persistence port for questions and answers.
///
/// Every mutation here is unconditional: ownership is checked by the
/// lifecycle engine before it calls in. Lists are ordered by creation time
/// ascending with a deterministic tie-break.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create_question(
        &self,
        owner_id: UserId,
        draft: &QuestionDraft,
    ) -> Result<Question, StoreError>;

    async fn get_question(&self, id: QuestionId) -> Result<Question, StoreError>;

    /// A question and its answers (creation ascending) read from one
    /// consistent snapshot: never a question whose thread is half deleted.
    async fn get_thread(&self, id: QuestionId) -> Result<(Question, Vec<Answer>), StoreError>;

    async fn list_questions(&self) -> Result<Vec<Question>, StoreError>;

    async fn list_questions_by_user(&self, owner_id: UserId) -> Result<Vec<Question>, StoreError>;

    async fn update_question(
        &self,
        id: QuestionId,
        draft: &QuestionDraft,
    ) -> Result<Question, StoreError>;

    /// Remove a question that has no answers left (`HasDependents` otherwise).
    async fn delete_question(&self, id: QuestionId) -> Result<(), StoreError>;

    /// Remove a question and every answer under it as one atomic unit.
    ///
    /// Returns how many answers were removed.
    async fn delete_question_thread(&self, id: QuestionId) -> Result<usize, StoreError>;

    /// Fails with `ParentNotFound` if `question_id` does not resolve.
    async fn create_answer(
        &self,
        owner_id: UserId,
        question_id: QuestionId,
        draft: &AnswerDraft,
    ) -> Result<Answer, StoreError>;

    async fn get_answer(&self, id: AnswerId) -> Result<Answer, StoreError>;

    async fn list_answers_by_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<Answer>, StoreError>;

    async fn list_answers_by_user(&self, owner_id: UserId) -> Result<Vec<Answer>, StoreError>;

    async fn update_answer(&self, id: AnswerId, draft: &AnswerDraft) -> Result<Answer, StoreError>;

    async fn delete_answer(&self, id: AnswerId) -> Result<(), StoreError>;
}

/// Server-side session bindings (token -> username).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn bind(&self, token: &SessionToken, username: &Username) -> Result<(), StoreError>;

    async fn lookup(&self, token: &SessionToken) -> Result<Option<Username>, StoreError>;

    /// Returns whether a binding existed.
    async fn unbind(&self, token: &SessionToken) -> Result<bool, StoreError>;
}

#[async_trait]
impl<T> UserRepository for Arc<T>
where
    T: UserRepository + ?Sized,
{
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        (**self).insert_user(user).await
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, StoreError> {
        (**self).find_by_username(username).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        (**self).find_by_id(id).await
    }
}

#[async_trait]
impl<T> ContentStore for Arc<T>
where
    T: ContentStore + ?Sized,
{
    async fn create_question(
        &self,
        owner_id: UserId,
        draft: &QuestionDraft,
    ) -> Result<Question, StoreError> {
        (**self).create_question(owner_id, draft).await
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StoreError> {
        (**self).get_question(id).await
    }

    async fn get_thread(&self, id: QuestionId) -> Result<(Question, Vec<Answer>), StoreError> {
        (**self).get_thread(id).await
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
        (**self).list_questions().await
    }

    async fn list_questions_by_user(&self, owner_id: UserId) -> Result<Vec<Question>, StoreError> {
        (**self).list_questions_by_user(owner_id).await
    }

    async fn update_question(
        &self,
        id: QuestionId,
        draft: &QuestionDraft,
    ) -> Result<Question, StoreError> {
        (**self).update_question(id, draft).await
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StoreError> {
        (**self).delete_question(id).await
    }

    async fn delete_question_thread(&self, id: QuestionId) -> Result<usize, StoreError> {
        (**self).delete_question_thread(id).await
    }

    async fn create_answer(
        &self,
        owner_id: UserId,
        question_id: QuestionId,
        draft: &AnswerDraft,
    ) -> Result<Answer, StoreError> {
        (**self).create_answer(owner_id, question_id, draft).await
    }

    async fn get_answer(&self, id: AnswerId) -> Result<Answer, StoreError> {
        (**self).get_answer(id).await
    }

    async fn list_answers_by_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<Answer>, StoreError> {
        (**self).list_answers_by_question(question_id).await
    }

    async fn list_answers_by_user(&self, owner_id: UserId) -> Result<Vec<Answer>, StoreError> {
        (**self).list_answers_by_user(owner_id).await
    }

    async fn update_answer(&self, id: AnswerId, draft: &AnswerDraft) -> Result<Answer, StoreError> {
        (**self).update_answer(id, draft).await
    }

    async fn delete_answer(&self, id: AnswerId) -> Result<(), StoreError> {
        (**self).delete_answer(id).await
    }
}

#[async_trait]
impl<T> SessionStore for Arc<T>
where
    T: SessionStore + ?Sized,
{
    async fn bind(&self, token: &SessionToken, username: &Username) -> Result<(), StoreError> {
        (**self).bind(token, username).await
    }

    async fn lookup(&self, token: &SessionToken) -> Result<Option<Username>, StoreError> {
        (**self).lookup(token).await
    }

    async fn unbind(&self, token: &SessionToken) -> Result<bool, StoreError> {
        (**self).unbind(token).await
    }
}
