use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use agora_auth::SessionContext;
use agora_core::{AnswerId, QuestionId};
use agora_infra::{Action, ActionOutcome};

use crate::app::dto::AnswerRequest;
use crate::app::errors;
use crate::app::extract::JsonBody;
use crate::app::routes::common::{dispatch, parse_id};
use crate::app::services::AppForum;

/// `POST /questions/:id/answers`
pub async fn create_answer(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<AnswerRequest>,
) -> Response {
    let question_id: QuestionId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let action = Action::CreateAnswer {
        question_id,
        content: body.content,
    };
    match dispatch(&forum, &session, action).await {
        Ok(ActionOutcome::AnswerCreated(answer)) => {
            (StatusCode::CREATED, Json(answer)).into_response()
        }
        Ok(_) => errors::unexpected_outcome("create_answer"),
        Err(resp) => resp,
    }
}

pub async fn edit_answer(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<AnswerRequest>,
) -> Response {
    let answer_id: AnswerId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let action = Action::EditAnswer {
        answer_id,
        content: body.content,
    };
    match dispatch(&forum, &session, action).await {
        Ok(ActionOutcome::AnswerEdited(answer)) => (StatusCode::OK, Json(answer)).into_response(),
        Ok(_) => errors::unexpected_outcome("edit_answer"),
        Err(resp) => resp,
    }
}

pub async fn delete_answer(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Response {
    let answer_id: AnswerId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match dispatch(&forum, &session, Action::DeleteAnswer { answer_id }).await {
        Ok(ActionOutcome::AnswerDeleted(_)) => StatusCode::NO_CONTENT.into_response(),
        Ok(_) => errors::unexpected_outcome("delete_answer"),
        Err(resp) => resp,
    }
}
