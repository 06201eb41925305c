//! Postgres-backed user and content stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `UniqueViolation` | Username already taken |
//! | Database (foreign key violation) | `23503` | `HasDependents` / `ParentNotFound` | Deleting a referenced question, answering a missing one |
//! | Database (other) | Any other | `Storage` | Other database errors |
//! | PoolClosed | N/A | `Storage` | Connection pool was closed |
//! | Other | N/A | `Storage` | Network errors, connection failures, etc. |
//!
//! Ordering ties on `created_on` are broken by the `seq` identity column, so
//! listings are stable across calls.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use agora_auth::{PasswordHash, User, Username};
use agora_content::{Answer, AnswerDraft, Question, QuestionDraft};
use agora_core::{AnswerId, QuestionId, UserId, now};

use super::r#trait::{ContentStore, StoreError, UserRepository};

/// Schema statements, applied in order by [`PostgresStore::ensure_schema`].
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        username      TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_on    TIMESTAMPTZ NOT NULL,
        updated_on    TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS questions (
        seq        BIGINT GENERATED ALWAYS AS IDENTITY,
        id         UUID PRIMARY KEY,
        owner_id   UUID NOT NULL REFERENCES users (id),
        title      TEXT NOT NULL,
        content    TEXT NOT NULL,
        created_on TIMESTAMPTZ NOT NULL,
        updated_on TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS answers (
        seq         BIGINT GENERATED ALWAYS AS IDENTITY,
        id          UUID PRIMARY KEY,
        owner_id    UUID NOT NULL REFERENCES users (id),
        question_id UUID NOT NULL REFERENCES questions (id),
        content     TEXT NOT NULL,
        created_on  TIMESTAMPTZ NOT NULL,
        updated_on  TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS questions_created_idx ON questions (created_on, seq)",
    "CREATE INDEX IF NOT EXISTS questions_owner_idx ON questions (owner_id)",
    "CREATE INDEX IF NOT EXISTS answers_question_idx ON answers (question_id, created_on, seq)",
    "CREATE INDEX IF NOT EXISTS answers_owner_idx ON answers (owner_id)",
];

const QUESTION_COLUMNS: &str = "id, owner_id, title, content, created_on, updated_on";
const ANSWER_COLUMNS: &str = "id, owner_id, question_id, content, created_on, updated_on";

/// Postgres adapter implementing [`UserRepository`] and [`ContentStore`].
///
/// Foreign keys make orphaned answers impossible at the database level;
/// [`ContentStore::delete_question_thread`] removes a thread in one
/// transaction.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, created_on, updated_on)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.username.as_str())
        .bind(user.password_hash.as_phc())
        .bind(user.created_on)
        .bind(user.updated_on)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_on, updated_on FROM users WHERE username = $1",
        )
        .bind(username.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_username", e))?;

        row.map(|r| user_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_on, updated_on FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.map(|r| user_from_row(&r)).transpose()
    }
}

#[async_trait]
impl ContentStore for PostgresStore {
    #[instrument(skip(self, draft), fields(owner_id = %owner_id), err)]
    async fn create_question(
        &self,
        owner_id: UserId,
        draft: &QuestionDraft,
    ) -> Result<Question, StoreError> {
        let question = Question::new(owner_id, draft.clone(), now());
        sqlx::query(
            r#"
            INSERT INTO questions (id, owner_id, title, content, created_on, updated_on)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(question.id.as_uuid())
        .bind(owner_id.as_uuid())
        .bind(&question.title)
        .bind(&question.content)
        .bind(question.created_on)
        .bind(question.updated_on)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_question", e))?;
        Ok(question)
    }

    #[instrument(skip(self), err)]
    async fn get_question(&self, id: QuestionId) -> Result<Question, StoreError> {
        let row = sqlx::query(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_question", e))?
            .ok_or(StoreError::NotFound)?;
        question_from_row(&row)
    }

    /// Both reads share one `REPEATABLE READ` snapshot, so a thread delete
    /// committing in between is either fully visible or not at all.
    #[instrument(skip(self), err)]
    async fn get_thread(&self, id: QuestionId) -> Result<(Question, Vec<Answer>), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("get_thread", e))?;

        let row = sqlx::query(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("get_thread", e))?
            .ok_or(StoreError::NotFound)?;
        let question = question_from_row(&row)?;

        let rows = sqlx::query(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE question_id = $1 ORDER BY created_on ASC, seq ASC"
        ))
        .bind(id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("get_thread", e))?;
        let answers = rows.iter().map(answer_from_row).collect::<Result<Vec<_>, _>>()?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok((question, answers))
    }

    #[instrument(skip(self), err)]
    async fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions ORDER BY created_on ASC, seq ASC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_questions", e))?;
        rows.iter().map(question_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_questions_by_user(&self, owner_id: UserId) -> Result<Vec<Question>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE owner_id = $1 ORDER BY created_on ASC, seq ASC"
        ))
        .bind(owner_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_questions_by_user", e))?;
        rows.iter().map(question_from_row).collect()
    }

    #[instrument(skip(self, draft), err)]
    async fn update_question(
        &self,
        id: QuestionId,
        draft: &QuestionDraft,
    ) -> Result<Question, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE questions
            SET title = $2, content = $3, updated_on = GREATEST($4, created_on)
            WHERE id = $1
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(draft.title())
        .bind(draft.content())
        .bind(now())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_question", e))?
        .ok_or(StoreError::NotFound)?;
        question_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn delete_question(&self, id: QuestionId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_question", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_question_thread(&self, id: QuestionId) -> Result<usize, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Lock the parent row so no answer can be attached mid-delete.
        let locked = sqlx::query("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_question_thread", e))?;
        if locked.is_none() {
            return Err(StoreError::NotFound);
        }

        let answers = sqlx::query("DELETE FROM answers WHERE question_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_question_thread", e))?;

        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_question_thread", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(answers.rows_affected() as usize)
    }

    #[instrument(skip(self, draft), fields(owner_id = %owner_id), err)]
    async fn create_answer(
        &self,
        owner_id: UserId,
        question_id: QuestionId,
        draft: &AnswerDraft,
    ) -> Result<Answer, StoreError> {
        let answer = Answer::new(owner_id, question_id, draft.clone(), now());
        sqlx::query(
            r#"
            INSERT INTO answers (id, owner_id, question_id, content, created_on, updated_on)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(answer.id.as_uuid())
        .bind(owner_id.as_uuid())
        .bind(question_id.as_uuid())
        .bind(&answer.content)
        .bind(answer.created_on)
        .bind(answer.updated_on)
        .execute(&*self.pool)
        .await
        .map_err(|e| match map_sqlx_error("create_answer", e) {
            StoreError::HasDependents(_) => StoreError::ParentNotFound,
            other => other,
        })?;
        Ok(answer)
    }

    #[instrument(skip(self), err)]
    async fn get_answer(&self, id: AnswerId) -> Result<Answer, StoreError> {
        let row = sqlx::query(&format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_answer", e))?
            .ok_or(StoreError::NotFound)?;
        answer_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn list_answers_by_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<Answer>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE question_id = $1 ORDER BY created_on ASC, seq ASC"
        ))
        .bind(question_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_answers_by_question", e))?;
        rows.iter().map(answer_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_answers_by_user(&self, owner_id: UserId) -> Result<Vec<Answer>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE owner_id = $1 ORDER BY created_on ASC, seq ASC"
        ))
        .bind(owner_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_answers_by_user", e))?;
        rows.iter().map(answer_from_row).collect()
    }

    #[instrument(skip(self, draft), err)]
    async fn update_answer(&self, id: AnswerId, draft: &AnswerDraft) -> Result<Answer, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE answers
            SET content = $2, updated_on = GREATEST($3, created_on)
            WHERE id = $1
            RETURNING {ANSWER_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(draft.content())
        .bind(now())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_answer", e))?
        .ok_or(StoreError::NotFound)?;
        answer_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn delete_answer(&self, id: AnswerId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM answers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_answer", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn decode<T>(operation: &str, result: Result<T, sqlx::Error>) -> Result<T, StoreError> {
    result.map_err(|e| StoreError::Storage(format!("failed to decode row in {operation}: {e}")))
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<User, StoreError> {
    let id: Uuid = decode("user", row.try_get("id"))?;
    let username: String = decode("user", row.try_get("username"))?;
    let password_hash: String = decode("user", row.try_get("password_hash"))?;
    let created_on: DateTime<Utc> = decode("user", row.try_get("created_on"))?;
    let updated_on: DateTime<Utc> = decode("user", row.try_get("updated_on"))?;

    let username = Username::parse(&username)
        .map_err(|e| StoreError::Storage(format!("stored username is invalid: {e}")))?;

    Ok(User {
        id: UserId::from_uuid(id),
        username,
        password_hash: PasswordHash::from_phc(password_hash),
        created_on,
        updated_on,
    })
}

fn question_from_row(row: &sqlx::postgres::PgRow) -> Result<Question, StoreError> {
    Ok(Question::restore(
        QuestionId::from_uuid(decode("question", row.try_get("id"))?),
        UserId::from_uuid(decode("question", row.try_get("owner_id"))?),
        decode("question", row.try_get("title"))?,
        decode("question", row.try_get("content"))?,
        decode("question", row.try_get("created_on"))?,
        decode("question", row.try_get("updated_on"))?,
    ))
}

fn answer_from_row(row: &sqlx::postgres::PgRow) -> Result<Answer, StoreError> {
    Ok(Answer::restore(
        AnswerId::from_uuid(decode("answer", row.try_get("id"))?),
        UserId::from_uuid(decode("answer", row.try_get("owner_id"))?),
        QuestionId::from_uuid(decode("answer", row.try_get("question_id"))?),
        decode("answer", row.try_get("content"))?,
        decode("answer", row.try_get("created_on"))?,
        decode("answer", row.try_get("updated_on"))?,
    ))
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(msg),
                Some("23503") => StoreError::HasDependents(msg),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_closed_maps_to_storage() {
        let err = map_sqlx_error("list_questions", sqlx::Error::PoolClosed);
        assert_eq!(
            err,
            StoreError::Storage("connection pool closed in list_questions".to_string())
        );
    }

    #[test]
    fn row_not_found_is_a_storage_error() {
        let err = map_sqlx_error("get_answer", sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Storage(_)));
    }

    #[test]
    fn schema_creates_parent_tables_before_children() {
        let position = |needle: &str| {
            SCHEMA
                .iter()
                .position(|s| s.contains(needle))
                .unwrap()
        };
        assert!(position("TABLE IF NOT EXISTS users") < position("TABLE IF NOT EXISTS questions"));
        assert!(position("TABLE IF NOT EXISTS questions") < position("TABLE IF NOT EXISTS answers"));
    }
}
