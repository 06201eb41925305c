//! Content lifecycle engine.
//!
//! Every mutation runs: resolve identity (done by the caller), load the
//! target, ask the authorization gate, then touch the store. Rejections are
//! returned as [`DomainError`] values; nothing is written when a check fails.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use agora_auth::{Identity, Principal, is_owner, require_owner};
use agora_content::{Answer, AnswerDraft, Question, QuestionDraft};
use agora_core::{AnswerId, DomainError, DomainResult, QuestionId, UserId};

use crate::store::ContentStore;

/// An answer as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerView {
    #[serde(flatten)]
    pub answer: Answer,
    pub can_modify: bool,
}

/// A question with its answers in creation order, annotated for the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub question: Question,
    pub can_modify: bool,
    pub answers: Vec<AnswerView>,
    pub viewer: Option<Principal>,
}

/// Result of deleting a question together with its answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThreadRemoval {
    pub question_id: QuestionId,
    pub answers_removed: usize,
}

/// Log a failed step at the level its kind deserves, then hand it back.
fn observe(operation: &'static str, err: DomainError) -> DomainError {
    if err.is_retryable() {
        warn!(operation, error = %err, "storage fault");
    } else {
        debug!(operation, code = err.code(), "rejected");
    }
    err
}

#[derive(Debug, Clone)]
pub struct ContentLifecycle<C> {
    content: C,
}

impl<C> ContentLifecycle<C>
where
    C: ContentStore,
{
    pub fn new(content: C) -> Self {
        Self { content }
    }

    pub fn store(&self) -> &C {
        &self.content
    }

    #[instrument(skip_all, fields(user_id = ?identity.user_id()))]
    pub async fn create_question(
        &self,
        identity: &Identity,
        draft: QuestionDraft,
    ) -> DomainResult<Question> {
        const OP: &str = "create_question";
        let principal = identity
            .require_authenticated()
            .map_err(|e| observe(OP, e))?;

        let question = self
            .content
            .create_question(principal.user_id, &draft)
            .await
            .map_err(|e| observe(OP, e.into()))?;

        info!(user_id = %principal.user_id, question_id = %question.id, "question created");
        Ok(question)
    }

    #[instrument(skip_all, fields(user_id = ?identity.user_id(), question_id = %question_id))]
    pub async fn create_answer(
        &self,
        identity: &Identity,
        question_id: QuestionId,
        draft: AnswerDraft,
    ) -> DomainResult<Answer> {
        const OP: &str = "create_answer";
        let principal = identity
            .require_authenticated()
            .map_err(|e| observe(OP, e))?;

        let question = self
            .content
            .get_question(question_id)
            .await
            .map_err(|e| observe(OP, e.into()))?;

        if is_owner(identity, &question) {
            return Err(observe(OP, DomainError::SelfAnswerForbidden));
        }

        // ParentNotFound here means the question vanished after the load.
        let answer = self
            .content
            .create_answer(principal.user_id, question_id, &draft)
            .await
            .map_err(|e| observe(OP, e.into()))?;

        info!(
            user_id = %principal.user_id,
            question_id = %question_id,
            answer_id = %answer.id,
            "answer created"
        );
        Ok(answer)
    }

    #[instrument(skip_all, fields(user_id = ?identity.user_id(), question_id = %question_id))]
    pub async fn edit_question(
        &self,
        identity: &Identity,
        question_id: QuestionId,
        draft: QuestionDraft,
    ) -> DomainResult<Question> {
        const OP: &str = "edit_question";
        let question = self
            .content
            .get_question(question_id)
            .await
            .map_err(|e| observe(OP, e.into()))?;
        require_owner(identity, &question).map_err(|e| observe(OP, e))?;

        let edited = self
            .content
            .update_question(question_id, &draft)
            .await
            .map_err(|e| observe(OP, e.into()))?;

        info!(user_id = %question.owner_id(), question_id = %question_id, "question edited");
        Ok(edited)
    }

    #[instrument(skip_all, fields(user_id = ?identity.user_id(), answer_id = %answer_id))]
    pub async fn edit_answer(
        &self,
        identity: &Identity,
        answer_id: AnswerId,
        draft: AnswerDraft,
    ) -> DomainResult<Answer> {
        const OP: &str = "edit_answer";
        let answer = self
            .content
            .get_answer(answer_id)
            .await
            .map_err(|e| observe(OP, e.into()))?;
        require_owner(identity, &answer).map_err(|e| observe(OP, e))?;

        let edited = self
            .content
            .update_answer(answer_id, &draft)
            .await
            .map_err(|e| observe(OP, e.into()))?;

        info!(user_id = %answer.owner_id(), answer_id = %answer_id, "answer edited");
        Ok(edited)
    }

    /// Delete a question and every answer under it, whoever wrote them.
    #[instrument(skip_all, fields(user_id = ?identity.user_id(), question_id = %question_id))]
    pub async fn delete_question(
        &self,
        identity: &Identity,
        question_id: QuestionId,
    ) -> DomainResult<ThreadRemoval> {
        const OP: &str = "delete_question";
        let question = self
            .content
            .get_question(question_id)
            .await
            .map_err(|e| observe(OP, e.into()))?;
        require_owner(identity, &question).map_err(|e| observe(OP, e))?;

        let answers_removed = self
            .content
            .delete_question_thread(question_id)
            .await
            .map_err(|e| observe(OP, e.into()))?;

        info!(
            user_id = %question.owner_id(),
            question_id = %question_id,
            answers_removed,
            "question deleted"
        );
        Ok(ThreadRemoval {
            question_id,
            answers_removed,
        })
    }

    #[instrument(skip_all, fields(user_id = ?identity.user_id(), answer_id = %answer_id))]
    pub async fn delete_answer(&self, identity: &Identity, answer_id: AnswerId) -> DomainResult<()> {
        const OP: &str = "delete_answer";
        let answer = self
            .content
            .get_answer(answer_id)
            .await
            .map_err(|e| observe(OP, e.into()))?;
        require_owner(identity, &answer).map_err(|e| observe(OP, e))?;

        self.content
            .delete_answer(answer_id)
            .await
            .map_err(|e| observe(OP, e.into()))?;

        info!(user_id = %answer.owner_id(), answer_id = %answer_id, "answer deleted");
        Ok(())
    }

    /// Public read of a question with its answers. No authorization check.
    #[instrument(skip_all, fields(question_id = %question_id))]
    pub async fn view_question(
        &self,
        identity: &Identity,
        question_id: QuestionId,
    ) -> DomainResult<QuestionView> {
        let (question, answers) = self
            .content
            .get_thread(question_id)
            .await
            .map_err(|e| observe("view_question", e.into()))?;

        Ok(QuestionView {
            can_modify: is_owner(identity, &question),
            answers: answers
                .into_iter()
                .map(|answer| AnswerView {
                    can_modify: is_owner(identity, &answer),
                    answer,
                })
                .collect(),
            question,
            viewer: identity.principal().cloned(),
        })
    }

    pub async fn list_questions(&self) -> DomainResult<Vec<Question>> {
        self.content
            .list_questions()
            .await
            .map_err(|e| observe("list_questions", e.into()))
    }

    pub async fn list_questions_by_user(&self, owner_id: UserId) -> DomainResult<Vec<Question>> {
        self.content
            .list_questions_by_user(owner_id)
            .await
            .map_err(|e| observe("list_questions_by_user", e.into()))
    }

    pub async fn list_answers_by_user(&self, owner_id: UserId) -> DomainResult<Vec<Answer>> {
        self.content
            .list_answers_by_user(owner_id)
            .await
            .map_err(|e| observe("list_answers_by_user", e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use agora_auth::Username;

    use crate::store::{InMemoryContentStore, StoreError};

    fn engine() -> ContentLifecycle<Arc<InMemoryContentStore>> {
        ContentLifecycle::new(Arc::new(InMemoryContentStore::new()))
    }

    fn identity(name: &str) -> Identity {
        Identity::Authenticated(Principal {
            user_id: UserId::new(),
            username: Username::parse(name).unwrap(),
        })
    }

    fn question(title: &str) -> QuestionDraft {
        QuestionDraft::new(title, "details").unwrap()
    }

    fn answer(text: &str) -> AnswerDraft {
        AnswerDraft::new(text).unwrap()
    }

    #[tokio::test]
    async fn anonymous_cannot_create() {
        let engine = engine();
        assert_eq!(
            engine.create_question(&Identity::Anonymous, question("q")).await,
            Err(DomainError::Unauthenticated)
        );

        let owner = identity("owner");
        let q = engine.create_question(&owner, question("q")).await.unwrap();
        assert_eq!(
            engine.create_answer(&Identity::Anonymous, q.id, answer("a")).await,
            Err(DomainError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn owner_cannot_answer_own_question() {
        let engine = engine();
        let owner = identity("owner");
        let other = identity("other");
        let q = engine.create_question(&owner, question("q")).await.unwrap();

        assert_eq!(
            engine.create_answer(&owner, q.id, answer("me")).await,
            Err(DomainError::SelfAnswerForbidden)
        );
        let a = engine.create_answer(&other, q.id, answer("you")).await.unwrap();
        assert_eq!(a.owner_id(), other.user_id().unwrap());
        assert_eq!(a.question_id(), q.id);
    }

    #[tokio::test]
    async fn answering_missing_question_is_not_found() {
        let engine = engine();
        assert_eq!(
            engine
                .create_answer(&identity("x"), QuestionId::new(), answer("a"))
                .await,
            Err(DomainError::NotFound)
        );
    }

    #[tokio::test]
    async fn non_owner_cannot_edit_or_delete() {
        let engine = engine();
        let owner = identity("owner");
        let intruder = identity("intruder");
        let q = engine.create_question(&owner, question("q")).await.unwrap();
        let a = engine.create_answer(&intruder, q.id, answer("a")).await.unwrap();

        for who in [&intruder, &Identity::Anonymous] {
            assert_eq!(
                engine.edit_question(who, q.id, question("hijack")).await,
                Err(DomainError::Forbidden)
            );
            assert_eq!(engine.delete_question(who, q.id).await, Err(DomainError::Forbidden));
        }
        for who in [&owner, &Identity::Anonymous] {
            assert_eq!(
                engine.edit_answer(who, a.id, answer("hijack")).await,
                Err(DomainError::Forbidden)
            );
            assert_eq!(engine.delete_answer(who, a.id).await, Err(DomainError::Forbidden));
        }

        // Nothing changed.
        let view = engine.view_question(&owner, q.id).await.unwrap();
        assert_eq!(view.question.title, "q");
        assert_eq!(view.answers.len(), 1);
        assert_eq!(view.answers[0].answer.content, "a");
    }

    #[tokio::test]
    async fn owner_edits_keep_ownership_and_creation_time() {
        let engine = engine();
        let owner = identity("owner");
        let q = engine.create_question(&owner, question("before")).await.unwrap();

        let edited = engine
            .edit_question(&owner, q.id, QuestionDraft::new("after", "new body").unwrap())
            .await
            .unwrap();
        assert_eq!(edited.title, "after");
        assert_eq!(edited.content, "new body");
        assert_eq!(edited.owner_id(), q.owner_id());
        assert_eq!(edited.created_on, q.created_on);
        assert!(edited.updated_on >= q.updated_on);
    }

    #[tokio::test]
    async fn edits_of_missing_content_are_not_found() {
        let engine = engine();
        let who = identity("who");
        assert_eq!(
            engine.edit_question(&who, QuestionId::new(), question("x")).await,
            Err(DomainError::NotFound)
        );
        assert_eq!(
            engine.delete_answer(&who, AnswerId::new()).await,
            Err(DomainError::NotFound)
        );
    }

    #[tokio::test]
    async fn owner_delete_cascades_over_foreign_answers() {
        let engine = engine();
        let owner = identity("owner");
        let q = engine.create_question(&owner, question("q")).await.unwrap();
        let other_q = engine.create_question(&owner, question("other")).await.unwrap();
        for name in ["b", "c", "d"] {
            engine.create_answer(&identity(name), q.id, answer(name)).await.unwrap();
        }
        let kept = engine
            .create_answer(&identity("e"), other_q.id, answer("kept"))
            .await
            .unwrap();

        let removal = engine.delete_question(&owner, q.id).await.unwrap();
        assert_eq!(
            removal,
            ThreadRemoval {
                question_id: q.id,
                answers_removed: 3
            }
        );

        assert_eq!(engine.view_question(&owner, q.id).await, Err(DomainError::NotFound));
        let remaining = engine.view_question(&owner, other_q.id).await.unwrap();
        assert_eq!(remaining.answers.len(), 1);
        assert_eq!(remaining.answers[0].answer.id, kept.id);
    }

    #[tokio::test]
    async fn view_flags_follow_ownership() {
        let engine = engine();
        let owner = identity("owner");
        let answerer = identity("answerer");
        let q = engine.create_question(&owner, question("q")).await.unwrap();
        engine.create_answer(&answerer, q.id, answer("a")).await.unwrap();

        let as_owner = engine.view_question(&owner, q.id).await.unwrap();
        assert!(as_owner.can_modify);
        assert!(!as_owner.answers[0].can_modify);
        assert_eq!(as_owner.viewer.as_ref().map(|p| p.user_id), owner.user_id());

        let as_answerer = engine.view_question(&answerer, q.id).await.unwrap();
        assert!(!as_answerer.can_modify);
        assert!(as_answerer.answers[0].can_modify);

        let as_anon = engine.view_question(&Identity::Anonymous, q.id).await.unwrap();
        assert!(!as_anon.can_modify);
        assert!(!as_anon.answers[0].can_modify);
        assert!(as_anon.viewer.is_none());
    }

    #[tokio::test]
    async fn per_user_listings() {
        let engine = engine();
        let alice = identity("alice");
        let bob = identity("bob");
        let q1 = engine.create_question(&alice, question("a1")).await.unwrap();
        engine.create_question(&bob, question("b1")).await.unwrap();
        let q3 = engine.create_question(&alice, question("a2")).await.unwrap();
        engine.create_answer(&bob, q1.id, answer("x")).await.unwrap();

        let ids: Vec<_> = engine
            .list_questions_by_user(alice.user_id().unwrap())
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec![q1.id, q3.id]);
        assert_eq!(engine.list_questions().await.unwrap().len(), 3);
        assert_eq!(
            engine.list_answers_by_user(bob.user_id().unwrap()).await.unwrap().len(),
            1
        );
    }

    /// Delegates to an in-memory store and, right after the first read that
    /// touches a question, deletes that question's thread. Models an owner's
    /// delete committing while a viewer is mid-request.
    struct DeleteAfterFirstRead {
        inner: Arc<InMemoryContentStore>,
        pending: Mutex<Option<QuestionId>>,
    }

    impl DeleteAfterFirstRead {
        async fn fire(&self) {
            let pending = self.pending.lock().unwrap().take();
            if let Some(id) = pending {
                self.inner.delete_question_thread(id).await.unwrap();
            }
        }
    }

    #[async_trait]
    impl ContentStore for DeleteAfterFirstRead {
        async fn create_question(
            &self,
            owner_id: UserId,
            draft: &QuestionDraft,
        ) -> Result<Question, StoreError> {
            self.inner.create_question(owner_id, draft).await
        }

        async fn get_question(&self, id: QuestionId) -> Result<Question, StoreError> {
            let read = self.inner.get_question(id).await;
            self.fire().await;
            read
        }

        async fn get_thread(&self, id: QuestionId) -> Result<(Question, Vec<Answer>), StoreError> {
            let read = self.inner.get_thread(id).await;
            self.fire().await;
            read
        }

        async fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
            self.inner.list_questions().await
        }

        async fn list_questions_by_user(&self, owner_id: UserId) -> Result<Vec<Question>, StoreError> {
            self.inner.list_questions_by_user(owner_id).await
        }

        async fn update_question(
            &self,
            id: QuestionId,
            draft: &QuestionDraft,
        ) -> Result<Question, StoreError> {
            self.inner.update_question(id, draft).await
        }

        async fn delete_question(&self, id: QuestionId) -> Result<(), StoreError> {
            self.inner.delete_question(id).await
        }

        async fn delete_question_thread(&self, id: QuestionId) -> Result<usize, StoreError> {
            self.inner.delete_question_thread(id).await
        }

        async fn create_answer(
            &self,
            owner_id: UserId,
            question_id: QuestionId,
            draft: &AnswerDraft,
        ) -> Result<Answer, StoreError> {
            self.inner.create_answer(owner_id, question_id, draft).await
        }

        async fn get_answer(&self, id: AnswerId) -> Result<Answer, StoreError> {
            self.inner.get_answer(id).await
        }

        async fn list_answers_by_question(
            &self,
            question_id: QuestionId,
        ) -> Result<Vec<Answer>, StoreError> {
            let read = self.inner.list_answers_by_question(question_id).await;
            self.fire().await;
            read
        }

        async fn list_answers_by_user(&self, owner_id: UserId) -> Result<Vec<Answer>, StoreError> {
            self.inner.list_answers_by_user(owner_id).await
        }

        async fn update_answer(&self, id: AnswerId, draft: &AnswerDraft) -> Result<Answer, StoreError> {
            self.inner.update_answer(id, draft).await
        }

        async fn delete_answer(&self, id: AnswerId) -> Result<(), StoreError> {
            self.inner.delete_answer(id).await
        }
    }

    #[tokio::test]
    async fn view_never_shows_a_half_deleted_thread() {
        let inner = Arc::new(InMemoryContentStore::new());
        let seeding = ContentLifecycle::new(inner.clone());
        let owner = identity("owner");
        let q = seeding.create_question(&owner, question("q")).await.unwrap();
        for name in ["b", "c", "d"] {
            seeding.create_answer(&identity(name), q.id, answer(name)).await.unwrap();
        }

        let engine = ContentLifecycle::new(DeleteAfterFirstRead {
            inner: inner.clone(),
            pending: Mutex::new(Some(q.id)),
        });

        // The delete lands after the snapshot: the view is the full thread.
        let view = engine.view_question(&Identity::Anonymous, q.id).await.unwrap();
        assert_eq!(view.question.id, q.id);
        assert_eq!(view.answers.len(), 3);

        assert_eq!(inner.row_count().unwrap(), (0, 0));
        assert_eq!(
            engine.view_question(&Identity::Anonymous, q.id).await,
            Err(DomainError::NotFound)
        );
    }
}
