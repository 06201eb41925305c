//! In-memory store adapters.
//!
//! Intended for tests/dev. Each store keeps its tables behind one `RwLock`, so
//! every operation (the cascading thread delete included) is a single critical
//! section and readers never observe a half-applied change.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use agora_auth::{SessionToken, User, Username};
use agora_content::{Answer, AnswerDraft, Question, QuestionDraft};
use agora_core::{AnswerId, QuestionId, Timestamp, UserId, now};

use super::r#trait::{ContentStore, SessionStore, StoreError, UserRepository};

fn poisoned() -> StoreError {
    StoreError::Storage("lock poisoned".to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct UserTable {
    by_id: HashMap<UserId, User>,
    id_by_username: HashMap<Username, UserId>,
}

/// In-memory user accounts with a unique username index.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.by_id.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        if table.id_by_username.contains_key(&user.username) {
            return Err(StoreError::UniqueViolation(format!(
                "users.username = '{}'",
                user.username
            )));
        }
        if table.by_id.contains_key(&user.id) {
            return Err(StoreError::UniqueViolation(format!("users.id = '{}'", user.id)));
        }
        table.id_by_username.insert(user.username.clone(), user.id);
        table.by_id.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table
            .id_by_username
            .get(username)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.by_id.get(&id).cloned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Content
// ─────────────────────────────────────────────────────────────────────────────

/// A stored value plus its insertion sequence (tie-break for equal timestamps).
#[derive(Debug, Clone)]
struct Row<T> {
    seq: u64,
    value: T,
}

#[derive(Debug, Default)]
struct ContentTables {
    questions: HashMap<QuestionId, Row<Question>>,
    answers: HashMap<AnswerId, Row<Answer>>,
    next_seq: u64,
}

impl ContentTables {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

fn ordered<'a, T, I>(rows: I, created_on: impl Fn(&T) -> Timestamp) -> Vec<T>
where
    T: Clone + 'a,
    I: Iterator<Item = &'a Row<T>>,
{
    let mut rows: Vec<&Row<T>> = rows.collect();
    rows.sort_by_key(|r| (created_on(&r.value), r.seq));
    rows.into_iter().map(|r| r.value.clone()).collect()
}

/// In-memory questions and answers.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    inner: RwLock<ContentTables>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(questions, answers)` currently stored.
    pub fn row_count(&self) -> Result<(usize, usize), StoreError> {
        let tables = self.inner.read().map_err(|_| poisoned())?;
        Ok((tables.questions.len(), tables.answers.len()))
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn create_question(
        &self,
        owner_id: UserId,
        draft: &QuestionDraft,
    ) -> Result<Question, StoreError> {
        let question = Question::new(owner_id, draft.clone(), now());
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        let seq = tables.next_seq();
        tables.questions.insert(
            question.id,
            Row {
                seq,
                value: question.clone(),
            },
        );
        Ok(question)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StoreError> {
        let tables = self.inner.read().map_err(|_| poisoned())?;
        tables
            .questions
            .get(&id)
            .map(|r| r.value.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn get_thread(&self, id: QuestionId) -> Result<(Question, Vec<Answer>), StoreError> {
        let tables = self.inner.read().map_err(|_| poisoned())?;
        let question = tables
            .questions
            .get(&id)
            .map(|r| r.value.clone())
            .ok_or(StoreError::NotFound)?;
        let answers = ordered(
            tables.answers.values().filter(|r| r.value.question_id() == id),
            |a: &Answer| a.created_on,
        );
        Ok((question, answers))
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
        let tables = self.inner.read().map_err(|_| poisoned())?;
        Ok(ordered(tables.questions.values(), |q: &Question| q.created_on))
    }

    async fn list_questions_by_user(&self, owner_id: UserId) -> Result<Vec<Question>, StoreError> {
        let tables = self.inner.read().map_err(|_| poisoned())?;
        Ok(ordered(
            tables
                .questions
                .values()
                .filter(|r| r.value.owner_id() == owner_id),
            |q: &Question| q.created_on,
        ))
    }

    async fn update_question(
        &self,
        id: QuestionId,
        draft: &QuestionDraft,
    ) -> Result<Question, StoreError> {
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        let row = tables.questions.get_mut(&id).ok_or(StoreError::NotFound)?;
        row.value.apply_edit(draft.clone(), now());
        Ok(row.value.clone())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StoreError> {
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        if !tables.questions.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if tables.answers.values().any(|r| r.value.question_id() == id) {
            return Err(StoreError::HasDependents(format!(
                "answers still reference question {id}"
            )));
        }
        tables.questions.remove(&id);
        Ok(())
    }

    async fn delete_question_thread(&self, id: QuestionId) -> Result<usize, StoreError> {
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        if !tables.questions.contains_key(&id) {
            return Err(StoreError::NotFound);
        }

        let children: Vec<AnswerId> = tables
            .answers
            .iter()
            .filter(|(_, r)| r.value.question_id() == id)
            .map(|(answer_id, _)| *answer_id)
            .collect();
        for answer_id in &children {
            tables.answers.remove(answer_id);
        }
        tables.questions.remove(&id);

        Ok(children.len())
    }

    async fn create_answer(
        &self,
        owner_id: UserId,
        question_id: QuestionId,
        draft: &AnswerDraft,
    ) -> Result<Answer, StoreError> {
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        if !tables.questions.contains_key(&question_id) {
            return Err(StoreError::ParentNotFound);
        }
        let answer = Answer::new(owner_id, question_id, draft.clone(), now());
        let seq = tables.next_seq();
        tables.answers.insert(
            answer.id,
            Row {
                seq,
                value: answer.clone(),
            },
        );
        Ok(answer)
    }

    async fn get_answer(&self, id: AnswerId) -> Result<Answer, StoreError> {
        let tables = self.inner.read().map_err(|_| poisoned())?;
        tables
            .answers
            .get(&id)
            .map(|r| r.value.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn list_answers_by_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<Answer>, StoreError> {
        let tables = self.inner.read().map_err(|_| poisoned())?;
        Ok(ordered(
            tables
                .answers
                .values()
                .filter(|r| r.value.question_id() == question_id),
            |a: &Answer| a.created_on,
        ))
    }

    async fn list_answers_by_user(&self, owner_id: UserId) -> Result<Vec<Answer>, StoreError> {
        let tables = self.inner.read().map_err(|_| poisoned())?;
        Ok(ordered(
            tables
                .answers
                .values()
                .filter(|r| r.value.owner_id() == owner_id),
            |a: &Answer| a.created_on,
        ))
    }

    async fn update_answer(&self, id: AnswerId, draft: &AnswerDraft) -> Result<Answer, StoreError> {
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        let row = tables.answers.get_mut(&id).ok_or(StoreError::NotFound)?;
        row.value.apply_edit(draft.clone(), now());
        Ok(row.value.clone())
    }

    async fn delete_answer(&self, id: AnswerId) -> Result<(), StoreError> {
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        tables
            .answers
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

/// Lifetime of a session binding unless configured otherwise.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct Binding {
    username: Username,
    issued_at: Instant,
}

impl Binding {
    fn is_live(&self, ttl: Duration) -> bool {
        self.issued_at.elapsed() < ttl
    }
}

/// In-memory session bindings with a fixed lifetime.
///
/// An expired token resolves to nothing. Expired bindings are swept on every
/// `bind`, so the map only holds sessions issued within the last `ttl`.
#[derive(Debug)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<SessionToken, Binding>>,
    ttl: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Bindings that would still resolve.
    pub fn active_sessions(&self) -> Result<usize, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().filter(|b| b.is_live(self.ttl)).count())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn bind(&self, token: &SessionToken, username: &Username) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.retain(|_, b| b.is_live(self.ttl));
        map.insert(
            token.clone(),
            Binding {
                username: username.clone(),
                issued_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn lookup(&self, token: &SessionToken) -> Result<Option<Username>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .get(token)
            .filter(|b| b.is_live(self.ttl))
            .map(|b| b.username.clone()))
    }

    async fn unbind(&self, token: &SessionToken) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(token).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use agora_auth::PasswordHash;

    fn user(name: &str) -> User {
        User::new(
            Username::parse(name).unwrap(),
            PasswordHash::from_phc("$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA"),
            now(),
        )
    }

    fn qdraft(title: &str) -> QuestionDraft {
        QuestionDraft::new(title, "body").unwrap()
    }

    fn adraft(content: &str) -> AnswerDraft {
        AnswerDraft::new(content).unwrap()
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_and_original_kept() {
        let repo = InMemoryUserRepository::new();
        let first = user("alice");
        repo.insert_user(&first).await.unwrap();

        let err = repo.insert_user(&user("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(repo.len().unwrap(), 1);

        let found = repo
            .find_by_username(&Username::parse("alice").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn lists_are_in_creation_order_and_stable() {
        let store = InMemoryContentStore::new();
        let owner = UserId::new();
        let mut created = Vec::new();
        for i in 0..20 {
            created.push(store.create_question(owner, &qdraft(&format!("q{i}"))).await.unwrap().id);
        }

        let first: Vec<_> = store.list_questions().await.unwrap().into_iter().map(|q| q.id).collect();
        let second: Vec<_> = store.list_questions().await.unwrap().into_iter().map(|q| q.id).collect();
        assert_eq!(first, created);
        assert_eq!(first, second);

        let listed = store.list_questions().await.unwrap();
        assert!(listed.windows(2).all(|w| w[0].created_on <= w[1].created_on));
    }

    #[tokio::test]
    async fn answers_listed_per_question_in_creation_order() {
        let store = InMemoryContentStore::new();
        let q1 = store.create_question(UserId::new(), &qdraft("one")).await.unwrap();
        let q2 = store.create_question(UserId::new(), &qdraft("two")).await.unwrap();
        let answerer = UserId::new();

        let a1 = store.create_answer(answerer, q1.id, &adraft("a1")).await.unwrap();
        let _b1 = store.create_answer(answerer, q2.id, &adraft("b1")).await.unwrap();
        let a2 = store.create_answer(answerer, q1.id, &adraft("a2")).await.unwrap();

        let ids: Vec<_> = store
            .list_answers_by_question(q1.id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![a1.id, a2.id]);
        assert_eq!(store.list_answers_by_user(answerer).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn answer_requires_existing_parent() {
        let store = InMemoryContentStore::new();
        let err = store
            .create_answer(UserId::new(), QuestionId::new(), &adraft("orphan"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::ParentNotFound);
        assert_eq!(store.row_count().unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn update_bumps_update_time_only() {
        let store = InMemoryContentStore::new();
        let q = store.create_question(UserId::new(), &qdraft("t")).await.unwrap();
        assert_eq!(q.created_on, q.updated_on);

        let edited = store
            .update_question(q.id, &QuestionDraft::new("t2", "b2").unwrap())
            .await
            .unwrap();
        assert_eq!(edited.created_on, q.created_on);
        assert!(edited.updated_on >= q.updated_on);
        assert_eq!(edited.title, "t2");
        assert_eq!(edited.owner_id(), q.owner_id());
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = InMemoryContentStore::new();
        assert_eq!(
            store.update_answer(AnswerId::new(), &adraft("x")).await.unwrap_err(),
            StoreError::NotFound
        );
        assert_eq!(
            store.update_question(QuestionId::new(), &qdraft("x")).await.unwrap_err(),
            StoreError::NotFound
        );
    }

    #[tokio::test]
    async fn bare_question_delete_refuses_to_orphan_answers() {
        let store = InMemoryContentStore::new();
        let q = store.create_question(UserId::new(), &qdraft("t")).await.unwrap();
        store.create_answer(UserId::new(), q.id, &adraft("a")).await.unwrap();

        let err = store.delete_question(q.id).await.unwrap_err();
        assert!(matches!(err, StoreError::HasDependents(_)));
        assert_eq!(store.row_count().unwrap(), (1, 1));
    }

    #[tokio::test]
    async fn thread_delete_removes_only_its_own_answers() {
        let store = InMemoryContentStore::new();
        let doomed = store.create_question(UserId::new(), &qdraft("doomed")).await.unwrap();
        let kept = store.create_question(UserId::new(), &qdraft("kept")).await.unwrap();
        for i in 0..3 {
            store
                .create_answer(UserId::new(), doomed.id, &adraft(&format!("d{i}")))
                .await
                .unwrap();
        }
        let survivor = store.create_answer(UserId::new(), kept.id, &adraft("k")).await.unwrap();

        assert_eq!(store.delete_question_thread(doomed.id).await.unwrap(), 3);

        assert_eq!(store.get_question(doomed.id).await.unwrap_err(), StoreError::NotFound);
        assert!(store.list_answers_by_question(doomed.id).await.unwrap().is_empty());
        assert_eq!(store.get_question(kept.id).await.unwrap().id, kept.id);
        assert_eq!(store.get_answer(survivor.id).await.unwrap().id, survivor.id);
        assert_eq!(store.row_count().unwrap(), (1, 1));

        assert_eq!(
            store.delete_question_thread(doomed.id).await.unwrap_err(),
            StoreError::NotFound
        );
    }

    #[tokio::test]
    async fn created_rows_read_back_equal() {
        let store = InMemoryContentStore::new();
        let q = store.create_question(UserId::new(), &qdraft("t")).await.unwrap();
        let a = store.create_answer(UserId::new(), q.id, &adraft("a")).await.unwrap();

        assert_eq!(store.get_question(q.id).await.unwrap(), q);
        assert_eq!(store.get_answer(a.id).await.unwrap(), a);
        assert_eq!(q.created_on.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[tokio::test]
    async fn thread_read_returns_question_with_ordered_answers() {
        let store = InMemoryContentStore::new();
        let q = store.create_question(UserId::new(), &qdraft("t")).await.unwrap();
        let other = store.create_question(UserId::new(), &qdraft("other")).await.unwrap();
        let a1 = store.create_answer(UserId::new(), q.id, &adraft("1")).await.unwrap();
        store.create_answer(UserId::new(), other.id, &adraft("x")).await.unwrap();
        let a2 = store.create_answer(UserId::new(), q.id, &adraft("2")).await.unwrap();

        let (question, answers) = store.get_thread(q.id).await.unwrap();
        assert_eq!(question, q);
        assert_eq!(answers, vec![a1, a2]);

        store.delete_question_thread(q.id).await.unwrap();
        assert_eq!(store.get_thread(q.id).await.unwrap_err(), StoreError::NotFound);
    }

    #[tokio::test]
    async fn poisoned_lock_surfaces_as_storage_error() {
        let store = Arc::new(InMemoryContentStore::new());
        let held = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = held.inner.write().unwrap();
            panic!("poison the content lock");
        })
        .join();

        assert!(matches!(store.row_count(), Err(StoreError::Storage(_))));
        assert!(matches!(store.list_questions().await, Err(StoreError::Storage(_))));

        let users = Arc::new(InMemoryUserRepository::new());
        let held = users.clone();
        let _ = std::thread::spawn(move || {
            let _guard = held.inner.write().unwrap();
            panic!("poison the user lock");
        })
        .join();
        assert!(matches!(users.len(), Err(StoreError::Storage(_))));
        assert!(matches!(users.is_empty(), Err(StoreError::Storage(_))));
    }

    #[tokio::test]
    async fn expired_sessions_do_not_resolve_and_are_swept() {
        let sessions = InMemorySessionStore::with_ttl(Duration::ZERO);
        let name = Username::parse("frank").unwrap();

        for _ in 0..5 {
            let token = SessionToken::generate();
            sessions.bind(&token, &name).await.unwrap();
            assert_eq!(sessions.lookup(&token).await.unwrap(), None);
        }
        assert_eq!(sessions.active_sessions().unwrap(), 0);
        // Each bind sweeps what expired before it; only the newest is left.
        assert_eq!(sessions.inner.read().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn live_sessions_resolve_within_ttl() {
        let sessions = InMemorySessionStore::with_ttl(Duration::from_secs(3600));
        let name = Username::parse("grace").unwrap();
        let first = SessionToken::generate();
        let second = SessionToken::generate();

        sessions.bind(&first, &name).await.unwrap();
        sessions.bind(&second, &name).await.unwrap();

        assert_eq!(sessions.lookup(&first).await.unwrap(), Some(name.clone()));
        assert_eq!(sessions.lookup(&second).await.unwrap(), Some(name));
        assert_eq!(sessions.active_sessions().unwrap(), 2);
        assert_eq!(InMemorySessionStore::new().ttl(), DEFAULT_SESSION_TTL);
    }

    #[tokio::test]
    async fn session_unbind_reports_whether_binding_existed() {
        let sessions = InMemorySessionStore::new();
        let token = SessionToken::generate();
        let name = Username::parse("erin").unwrap();

        sessions.bind(&token, &name).await.unwrap();
        assert_eq!(sessions.lookup(&token).await.unwrap(), Some(name));
        assert!(sessions.unbind(&token).await.unwrap());
        assert!(!sessions.unbind(&token).await.unwrap());
        assert_eq!(sessions.lookup(&token).await.unwrap(), None);
    }
}
