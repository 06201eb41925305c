use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use agora_auth::SessionContext;
use agora_infra::{Action, ActionOutcome};

use crate::app::dto::{CredentialsRequest, SessionResponse};
use crate::app::errors;
use crate::app::extract::JsonBody;
use crate::app::routes::common::dispatch;
use crate::app::services::AppForum;

pub async fn register(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
    JsonBody(body): JsonBody<CredentialsRequest>,
) -> Response {
    let action = Action::RegisterUser {
        username: body.username,
        password: body.password,
    };
    match dispatch(&forum, &session, action).await {
        Ok(ActionOutcome::Registered { user, session }) => (
            StatusCode::CREATED,
            Json(SessionResponse::new(&user, &session)),
        )
            .into_response(),
        Ok(_) => errors::unexpected_outcome("register_user"),
        Err(resp) => resp,
    }
}

pub async fn login(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
    JsonBody(body): JsonBody<CredentialsRequest>,
) -> Response {
    let action = Action::Login {
        username: body.username,
        password: body.password,
    };
    match dispatch(&forum, &session, action).await {
        Ok(ActionOutcome::LoggedIn { user, session }) => {
            (StatusCode::OK, Json(SessionResponse::new(&user, &session))).into_response()
        }
        Ok(_) => errors::unexpected_outcome("login"),
        Err(resp) => resp,
    }
}

pub async fn logout(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    match dispatch(&forum, &session, Action::Logout).await {
        Ok(ActionOutcome::LoggedOut) => StatusCode::NO_CONTENT.into_response(),
        Ok(_) => errors::unexpected_outcome("logout"),
        Err(resp) => resp,
    }
}
