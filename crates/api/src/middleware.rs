use axum::{
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use agora_auth::SessionContext;

/// Attach the caller's [`SessionContext`] to the request.
///
/// A missing or malformed `Authorization: Bearer` header is not rejected here:
/// the request simply runs anonymously and the action decides whether that is
/// acceptable.
pub async fn session_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let session = SessionContext::from_raw(extract_bearer(req.headers()));
    req.extensions_mut().insert(session);
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_bearer(&headers("Bearer   padded  ")), Some("padded"));
    }

    #[test]
    fn anything_else_is_anonymous() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
        assert_eq!(extract_bearer(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(extract_bearer(&headers("Bearer ")), None);
    }
}
