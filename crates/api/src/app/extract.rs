//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    response::Response,
};
use serde::de::DeserializeOwned;

use crate::app::errors;

/// `Json<T>` whose rejections (bad syntax, missing fields, wrong content
/// type) come back in the same `{"error", "message"}` shape as domain errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_response(rejection)),
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> Response {
    tracing::debug!(status = %rejection.status(), "request body rejected");
    errors::json_error(rejection.status(), "invalid_body", rejection.body_text())
}
