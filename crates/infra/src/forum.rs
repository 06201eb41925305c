//! Action dispatch: the single entry point boundaries call into.
//!
//! ```text
//! (SessionContext, Action)
//!   ↓
//! 1. Resolve identity from the session
//!   ↓
//! 2. Validate payload into a draft
//!   ↓
//! 3. Run the identity / session / lifecycle operation
//!   ↓
//! ActionOutcome | DomainError
//! ```

use tracing::{Instrument, info_span};

use agora_auth::{CredentialHasher, Identity, SessionContext, User};
use agora_content::{Answer, AnswerDraft, Question, QuestionDraft};
use agora_core::{AnswerId, DomainResult, QuestionId, UserId};

use crate::identity::IdentityStore;
use crate::lifecycle::{ContentLifecycle, QuestionView, ThreadRemoval};
use crate::session::SessionResolver;
use crate::store::{ContentStore, SessionStore, UserRepository};

/// Something a caller asks the forum to do.
///
/// Deliberately not `Debug`: credential-bearing variants carry raw passwords.
#[derive(Clone, PartialEq, Eq)]
pub enum Action {
    RegisterUser { username: String, password: String },
    Login { username: String, password: String },
    Logout,
    WhoAmI,
    CreateQuestion { title: String, content: String },
    ListQuestions,
    ListQuestionsByUser { user_id: UserId },
    ListAnswersByUser { user_id: UserId },
    GetQuestion { question_id: QuestionId },
    EditQuestion { question_id: QuestionId, title: String, content: String },
    DeleteQuestion { question_id: QuestionId },
    CreateAnswer { question_id: QuestionId, content: String },
    EditAnswer { answer_id: AnswerId, content: String },
    DeleteAnswer { answer_id: AnswerId },
}

impl Action {
    /// Stable operation name for logs and spans.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::RegisterUser { .. } => "register_user",
            Self::Login { .. } => "login",
            Self::Logout => "logout",
            Self::WhoAmI => "whoami",
            Self::CreateQuestion { .. } => "create_question",
            Self::ListQuestions => "list_questions",
            Self::ListQuestionsByUser { .. } => "list_questions_by_user",
            Self::ListAnswersByUser { .. } => "list_answers_by_user",
            Self::GetQuestion { .. } => "get_question",
            Self::EditQuestion { .. } => "edit_question",
            Self::DeleteQuestion { .. } => "delete_question",
            Self::CreateAnswer { .. } => "create_answer",
            Self::EditAnswer { .. } => "edit_answer",
            Self::DeleteAnswer { .. } => "delete_answer",
        }
    }
}

/// Successful result of an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A new account plus the session it is now logged into.
    Registered { user: User, session: SessionContext },
    LoggedIn { user: User, session: SessionContext },
    LoggedOut,
    WhoAmI(Identity),
    QuestionCreated(Question),
    Questions(Vec<Question>),
    QuestionViewed(QuestionView),
    QuestionEdited(Question),
    QuestionDeleted(ThreadRemoval),
    Answers(Vec<Answer>),
    AnswerCreated(Answer),
    AnswerEdited(Answer),
    AnswerDeleted(AnswerId),
}

/// The forum: identity store, session resolver and lifecycle engine behind
/// one dispatch function.
#[derive(Debug, Clone)]
pub struct Forum<U, C, S> {
    identities: IdentityStore<U>,
    sessions: SessionResolver<U, S>,
    lifecycle: ContentLifecycle<C>,
}

impl<U, C, S> Forum<U, C, S>
where
    U: UserRepository + Clone,
    C: ContentStore,
    S: SessionStore,
{
    pub fn new(users: U, content: C, sessions: S, hasher: CredentialHasher) -> Self {
        Self {
            identities: IdentityStore::new(users.clone(), hasher),
            sessions: SessionResolver::new(users, sessions),
            lifecycle: ContentLifecycle::new(content),
        }
    }

    pub fn identities(&self) -> &IdentityStore<U> {
        &self.identities
    }

    pub fn sessions(&self) -> &SessionResolver<U, S> {
        &self.sessions
    }

    pub fn lifecycle(&self) -> &ContentLifecycle<C> {
        &self.lifecycle
    }

    /// Run one action on behalf of whoever holds `ctx`.
    pub async fn dispatch(&self, ctx: &SessionContext, action: Action) -> DomainResult<ActionOutcome> {
        let span = info_span!("dispatch", operation = action.operation());
        self.run(ctx, action).instrument(span).await
    }

    async fn run(&self, ctx: &SessionContext, action: Action) -> DomainResult<ActionOutcome> {
        match action {
            Action::RegisterUser { username, password } => {
                let user = self.identities.register(&username, &password).await?;
                let session = self.sessions.establish(ctx, &user).await?;
                Ok(ActionOutcome::Registered { user, session })
            }
            Action::Login { username, password } => {
                let user = self.identities.authenticate(&username, &password).await?;
                let session = self.sessions.establish(ctx, &user).await?;
                Ok(ActionOutcome::LoggedIn { user, session })
            }
            Action::Logout => {
                self.sessions.clear(ctx).await?;
                Ok(ActionOutcome::LoggedOut)
            }
            Action::WhoAmI => Ok(ActionOutcome::WhoAmI(self.sessions.current_user(ctx).await?)),
            Action::CreateQuestion { title, content } => {
                let identity = self.sessions.current_user(ctx).await?;
                identity.require_authenticated()?;
                let draft = QuestionDraft::new(&title, &content)?;
                let question = self.lifecycle.create_question(&identity, draft).await?;
                Ok(ActionOutcome::QuestionCreated(question))
            }
            Action::ListQuestions => Ok(ActionOutcome::Questions(
                self.lifecycle.list_questions().await?,
            )),
            Action::ListQuestionsByUser { user_id } => {
                self.identities.find_by_id(user_id).await?;
                Ok(ActionOutcome::Questions(
                    self.lifecycle.list_questions_by_user(user_id).await?,
                ))
            }
            Action::ListAnswersByUser { user_id } => {
                self.identities.find_by_id(user_id).await?;
                Ok(ActionOutcome::Answers(
                    self.lifecycle.list_answers_by_user(user_id).await?,
                ))
            }
            Action::GetQuestion { question_id } => {
                let identity = self.sessions.current_user(ctx).await?;
                let view = self.lifecycle.view_question(&identity, question_id).await?;
                Ok(ActionOutcome::QuestionViewed(view))
            }
            Action::EditQuestion {
                question_id,
                title,
                content,
            } => {
                let identity = self.sessions.current_user(ctx).await?;
                let draft = QuestionDraft::new(&title, &content)?;
                let question = self
                    .lifecycle
                    .edit_question(&identity, question_id, draft)
                    .await?;
                Ok(ActionOutcome::QuestionEdited(question))
            }
            Action::DeleteQuestion { question_id } => {
                let identity = self.sessions.current_user(ctx).await?;
                let removal = self.lifecycle.delete_question(&identity, question_id).await?;
                Ok(ActionOutcome::QuestionDeleted(removal))
            }
            Action::CreateAnswer {
                question_id,
                content,
            } => {
                let identity = self.sessions.current_user(ctx).await?;
                identity.require_authenticated()?;
                let draft = AnswerDraft::new(&content)?;
                let answer = self
                    .lifecycle
                    .create_answer(&identity, question_id, draft)
                    .await?;
                Ok(ActionOutcome::AnswerCreated(answer))
            }
            Action::EditAnswer { answer_id, content } => {
                let identity = self.sessions.current_user(ctx).await?;
                let draft = AnswerDraft::new(&content)?;
                let answer = self.lifecycle.edit_answer(&identity, answer_id, draft).await?;
                Ok(ActionOutcome::AnswerEdited(answer))
            }
            Action::DeleteAnswer { answer_id } => {
                let identity = self.sessions.current_user(ctx).await?;
                self.lifecycle.delete_answer(&identity, answer_id).await?;
                Ok(ActionOutcome::AnswerDeleted(answer_id))
            }
        }
    }
}
