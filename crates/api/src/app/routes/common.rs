use std::str::FromStr;

use axum::response::Response;

use agora_auth::SessionContext;
use agora_core::DomainError;
use agora_infra::{Action, ActionOutcome};

use crate::app::errors;
use crate::app::services::AppForum;

/// Dispatch an action, turning a domain rejection into its HTTP response.
pub async fn dispatch(
    forum: &AppForum,
    session: &SessionContext,
    action: Action,
) -> Result<ActionOutcome, Response> {
    forum
        .dispatch(session, action)
        .await
        .map_err(errors::domain_error_to_response)
}

/// Parse a path identifier (`400 invalid_id` on failure).
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}
