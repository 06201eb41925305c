//! Session identity resolver.
//!
//! Maps an explicit [`SessionContext`] to an [`Identity`]. There is no
//! ambient "current user": callers pass the context into every call.

use tracing::{debug, info, instrument};

use agora_auth::{Identity, SessionContext, SessionToken, User};
use agora_core::DomainResult;

use crate::store::{SessionStore, UserRepository};

#[derive(Debug, Clone)]
pub struct SessionResolver<U, S> {
    users: U,
    sessions: S,
}

impl<U, S> SessionResolver<U, S>
where
    U: UserRepository,
    S: SessionStore,
{
    pub fn new(users: U, sessions: S) -> Self {
        Self { users, sessions }
    }

    /// Resolve the acting identity.
    ///
    /// No token, an unknown token, or a binding whose user no longer exists
    /// all resolve to [`Identity::Anonymous`]. Only storage faults are errors.
    #[instrument(skip_all, fields(has_token = ctx.token().is_some()))]
    pub async fn current_user(&self, ctx: &SessionContext) -> DomainResult<Identity> {
        let Some(token) = ctx.token() else {
            return Ok(Identity::Anonymous);
        };
        let Some(username) = self.sessions.lookup(token).await? else {
            debug!("unknown session token");
            return Ok(Identity::Anonymous);
        };
        match self.users.find_by_username(&username).await? {
            Some(user) => Ok(Identity::authenticated(&user)),
            None => {
                debug!(%username, "session bound to a missing user");
                Ok(Identity::Anonymous)
            }
        }
    }

    /// Bind a verified user to a fresh session, retiring the caller's old token.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn establish(&self, ctx: &SessionContext, user: &User) -> DomainResult<SessionContext> {
        if let Some(old) = ctx.token() {
            self.sessions.unbind(old).await?;
        }
        let token = SessionToken::generate();
        self.sessions.bind(&token, &user.username).await?;
        info!(user_id = %user.id, "session established");
        Ok(SessionContext::with_token(token))
    }

    /// Drop the caller's session binding. Calling it twice is harmless.
    #[instrument(skip_all)]
    pub async fn clear(&self, ctx: &SessionContext) -> DomainResult<()> {
        if let Some(token) = ctx.token() {
            if self.sessions.unbind(token).await? {
                info!("session cleared");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;

    use agora_auth::{PasswordHash, Username};

    use crate::store::{InMemorySessionStore, InMemoryUserRepository};

    type Resolver = SessionResolver<Arc<InMemoryUserRepository>, Arc<InMemorySessionStore>>;

    async fn setup() -> (Resolver, Arc<InMemorySessionStore>, User) {
        let users = Arc::new(InMemoryUserRepository::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let user = User::new(
            Username::parse("alice").unwrap(),
            PasswordHash::from_phc("$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA"),
            Utc::now(),
        );
        users.insert_user(&user).await.unwrap();
        (SessionResolver::new(users, sessions.clone()), sessions, user)
    }

    #[tokio::test]
    async fn no_token_is_anonymous() {
        let (resolver, _, _) = setup().await;
        let identity = resolver.current_user(&SessionContext::anonymous()).await.unwrap();
        assert_eq!(identity, Identity::Anonymous);
    }

    #[tokio::test]
    async fn unknown_token_is_anonymous() {
        let (resolver, _, _) = setup().await;
        let ctx = SessionContext::with_token(SessionToken::generate());
        assert_eq!(resolver.current_user(&ctx).await.unwrap(), Identity::Anonymous);
    }

    #[tokio::test]
    async fn established_session_resolves_to_user() {
        let (resolver, _, user) = setup().await;
        let ctx = resolver
            .establish(&SessionContext::anonymous(), &user)
            .await
            .unwrap();

        let identity = resolver.current_user(&ctx).await.unwrap();
        assert_eq!(identity.user_id(), Some(user.id));
    }

    #[tokio::test]
    async fn establish_rotates_token() {
        let (resolver, sessions, user) = setup().await;
        let first = resolver.establish(&SessionContext::anonymous(), &user).await.unwrap();
        let second = resolver.establish(&first, &user).await.unwrap();

        assert_ne!(first.token(), second.token());
        assert_eq!(resolver.current_user(&first).await.unwrap(), Identity::Anonymous);
        assert!(resolver.current_user(&second).await.unwrap().is_authenticated());
        assert_eq!(sessions.active_sessions().unwrap(), 1);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let (resolver, _, user) = setup().await;
        let ctx = resolver.establish(&SessionContext::anonymous(), &user).await.unwrap();

        resolver.clear(&ctx).await.unwrap();
        resolver.clear(&ctx).await.unwrap();
        resolver.clear(&SessionContext::anonymous()).await.unwrap();

        assert_eq!(resolver.current_user(&ctx).await.unwrap(), Identity::Anonymous);
    }

    #[tokio::test]
    async fn binding_to_missing_user_is_anonymous() {
        let (resolver, sessions, _) = setup().await;
        let token = SessionToken::generate();
        sessions
            .bind(&token, &Username::parse("deleted").unwrap())
            .await
            .unwrap();

        let identity = resolver
            .current_user(&SessionContext::with_token(token))
            .await
            .unwrap();
        assert_eq!(identity, Identity::Anonymous);
    }
}
