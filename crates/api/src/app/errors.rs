use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use agora_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::Unauthenticated | DomainError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden | DomainError::SelfAnswerForbidden => StatusCode::FORBIDDEN,
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::DuplicateUsername(_) => StatusCode::CONFLICT,
        DomainError::Validation(_) | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
        DomainError::Persistence(detail) => {
            // Storage detail stays in the logs.
            tracing::error!(error = %detail, "persistence failure");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.code(),
                "internal storage error",
            );
        }
    };
    json_error(status, err.code(), err.to_string())
}

/// The dispatcher answered with an outcome the handler did not ask for.
pub fn unexpected_outcome(operation: &'static str) -> axum::response::Response {
    tracing::error!(operation, "unexpected action outcome");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "unexpected action outcome",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
