//! Opaque session capability passed explicitly into every call.
//!
//! How the token travels (cookie, header) is the transport's business; this
//! crate only needs it to be unguessable and comparable.

use uuid::Uuid;

const MAX_TOKEN_CHARS: usize = 128;

/// Bearer token naming one server-side session binding.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Mint a fresh random token (122 random bits).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accept a token presented by a client.
    ///
    /// Returns `None` for empty, overlong or non-printable input; such a
    /// context is simply anonymous.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > MAX_TOKEN_CHARS {
            return None;
        }
        if !raw.chars().all(|c| c.is_ascii_graphic()) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionToken({prefix}…)")
    }
}

/// Session state carried by one inbound action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionContext {
    token: Option<SessionToken>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: SessionToken) -> Self {
        Self { token: Some(token) }
    }

    /// Build a context from an optional raw client value.
    pub fn from_raw(raw: Option<&str>) -> Self {
        Self {
            token: raw.and_then(SessionToken::parse),
        }
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_and_parseable() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert_eq!(SessionToken::parse(a.as_str()), Some(a));
    }

    #[test]
    fn junk_tokens_yield_anonymous_context() {
        assert_eq!(SessionContext::from_raw(None), SessionContext::anonymous());
        assert_eq!(SessionContext::from_raw(Some("   ")), SessionContext::anonymous());
        assert_eq!(SessionContext::from_raw(Some("has space")), SessionContext::anonymous());
        assert!(SessionContext::from_raw(Some(&"x".repeat(200))).token().is_none());
    }

    #[test]
    fn debug_does_not_leak_full_token() {
        let token = SessionToken::parse("abcdef0123456789").unwrap();
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("0123456789"));
    }
}
