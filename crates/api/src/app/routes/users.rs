use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use agora_auth::SessionContext;
use agora_core::UserId;
use agora_infra::{Action, ActionOutcome};

use crate::app::dto::ItemsResponse;
use crate::app::errors;
use crate::app::routes::common::{dispatch, parse_id};
use crate::app::services::AppForum;

pub async fn list_user_questions(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Response {
    let user_id: UserId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match dispatch(&forum, &session, Action::ListQuestionsByUser { user_id }).await {
        Ok(ActionOutcome::Questions(items)) => {
            (StatusCode::OK, Json(ItemsResponse { items })).into_response()
        }
        Ok(_) => errors::unexpected_outcome("list_questions_by_user"),
        Err(resp) => resp,
    }
}

pub async fn list_user_answers(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Response {
    let user_id: UserId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match dispatch(&forum, &session, Action::ListAnswersByUser { user_id }).await {
        Ok(ActionOutcome::Answers(items)) => {
            (StatusCode::OK, Json(ItemsResponse { items })).into_response()
        }
        Ok(_) => errors::unexpected_outcome("list_answers_by_user"),
        Err(resp) => resp,
    }
}
