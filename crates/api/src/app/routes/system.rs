use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use agora_auth::SessionContext;
use agora_infra::{Action, ActionOutcome};

use crate::app::dto::WhoAmIResponse;
use crate::app::errors;
use crate::app::routes::common::dispatch;
use crate::app::services::AppForum;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(forum): Extension<Arc<AppForum>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    match dispatch(&forum, &session, Action::WhoAmI).await {
        Ok(ActionOutcome::WhoAmI(identity)) => {
            (StatusCode::OK, Json(WhoAmIResponse::from(&identity))).into_response()
        }
        Ok(_) => errors::unexpected_outcome("whoami"),
        Err(resp) => resp,
    }
}
