use serde::{Deserialize, Serialize};

use agora_auth::{Identity, Principal, SessionContext, User};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `/register` and `/login`.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub content: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SessionResponse<'a> {
    pub user: &'a User,
    pub session_token: Option<&'a str>,
}

impl<'a> SessionResponse<'a> {
    pub fn new(user: &'a User, session: &'a SessionContext) -> Self {
        Self {
            user,
            session_token: session.token().map(|t| t.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse<'a> {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<&'a Principal>,
}

impl<'a> From<&'a Identity> for WhoAmIResponse<'a> {
    fn from(identity: &'a Identity) -> Self {
        Self {
            authenticated: identity.is_authenticated(),
            user: identity.principal(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}
