use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use agora_auth::SessionContext;
use agora_core::QuestionId;
use agora_infra::{Action, ActionOutcome};

use crate::app::dto::{ItemsResponse, QuestionRequest};
use crate::app::errors;
use crate::app::extract::JsonBody;
use crate::app::routes::common::{dispatch, parse_id};
use crate::app::services::AppForum;

pub async fn list_questions(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    match dispatch(&forum, &session, Action::ListQuestions).await {
        Ok(ActionOutcome::Questions(items)) => {
            (StatusCode::OK, Json(ItemsResponse { items })).into_response()
        }
        Ok(_) => errors::unexpected_outcome("list_questions"),
        Err(resp) => resp,
    }
}

pub async fn create_question(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
    JsonBody(body): JsonBody<QuestionRequest>,
) -> Response {
    let action = Action::CreateQuestion {
        title: body.title,
        content: body.content,
    };
    match dispatch(&forum, &session, action).await {
        Ok(ActionOutcome::QuestionCreated(question)) => {
            (StatusCode::CREATED, Json(question)).into_response()
        }
        Ok(_) => errors::unexpected_outcome("create_question"),
        Err(resp) => resp,
    }
}

pub async fn get_question(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Response {
    let question_id: QuestionId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match dispatch(&forum, &session, Action::GetQuestion { question_id }).await {
        Ok(ActionOutcome::QuestionViewed(view)) => (StatusCode::OK, Json(view)).into_response(),
        Ok(_) => errors::unexpected_outcome("get_question"),
        Err(resp) => resp,
    }
}

pub async fn edit_question(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<QuestionRequest>,
) -> Response {
    let question_id: QuestionId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let action = Action::EditQuestion {
        question_id,
        title: body.title,
        content: body.content,
    };
    match dispatch(&forum, &session, action).await {
        Ok(ActionOutcome::QuestionEdited(question)) => {
            (StatusCode::OK, Json(question)).into_response()
        }
        Ok(_) => errors::unexpected_outcome("edit_question"),
        Err(resp) => resp,
    }
}

pub async fn delete_question(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Response {
    let question_id: QuestionId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match dispatch(&forum, &session, Action::DeleteQuestion { question_id }).await {
        Ok(ActionOutcome::QuestionDeleted(removal)) => (
            StatusCode::OK,
            Json(json!({
                "id": removal.question_id,
                "answers_removed": removal.answers_removed,
            })),
        )
            .into_response(),
        Ok(_) => errors::unexpected_outcome("delete_question"),
        Err(resp) => resp,
    }
}
