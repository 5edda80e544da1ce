//! Resolves the caller behind a bearer token.
//!
//! Sessions are issued by the login flow, which lives outside this service; it
//! stores `session:{token}` → user id in Redis. We only read them.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::store::DocumentStore;

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Fails with [`AppError::Unauthorized`] for unknown or stale tokens.
    async fn resolve(&self, token: &str) -> Result<CurrentUser, AppError>;
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub fn session_key(token: &str) -> String {
    format!("session:{token}")
}

/// Reads sessions over one managed, multiplexed Redis connection shared by
/// all requests. The manager reconnects on its own after a dropped link.
pub struct RedisSessionResolver {
    sessions: ConnectionManager,
    store: Arc<dyn DocumentStore>,
}

impl RedisSessionResolver {
    pub fn new(sessions: ConnectionManager, store: Arc<dyn DocumentStore>) -> Self {
        RedisSessionResolver { sessions, store }
    }

    pub async fn connect(
        client: redis::Client,
        store: Arc<dyn DocumentStore>,
    ) -> anyhow::Result<Self> {
        let sessions = ConnectionManager::new(client)
            .await
            .context("connecting to the session store")?;
        Ok(Self::new(sessions, store))
    }
}

#[async_trait]
impl IdentityResolver for RedisSessionResolver {
    async fn resolve(&self, token: &str) -> Result<CurrentUser, AppError> {
        let mut conn = self.sessions.clone();
        let user_id: Option<String> = conn
            .get(session_key(token))
            .await
            .context("reading session")?;

        let Some(user_id) = user_id.and_then(|raw| Uuid::parse_str(&raw).ok()) else {
            debug!("no valid session for presented token");
            return Err(AppError::Unauthorized);
        };

        match self.store.find_user(user_id).await? {
            Some(user) => Ok(user.into()),
            None => {
                debug!(%user_id, "session refers to an unknown user");
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Fixed token → user table for tests.
#[cfg(test)]
#[derive(Default)]
pub struct StaticIdentityResolver {
    sessions: std::collections::HashMap<String, CurrentUser>,
}

#[cfg(test)]
impl StaticIdentityResolver {
    pub fn with_session(mut self, token: &str, user: CurrentUser) -> Self {
        self.sessions.insert(token.to_string(), user);
        self
    }
}

#[cfg(test)]
#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<CurrentUser, AppError> {
        self.sessions
            .get(token)
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use futures::future::try_join_all;

    use super::*;
    use crate::models::user::{Role, User};
    use crate::store::memory::InMemoryDocumentStore;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_is_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("bearer  abc123 ")), Some("abc123"));
    }

    #[test]
    fn test_other_schemes_are_ignored() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("abc123")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_key_layout() {
        assert_eq!(session_key("t0k"), "session:t0k");
    }

    #[tokio::test]
    #[ignore = "Requires a running Redis at REDIS_URL"]
    async fn test_concurrent_lookups_share_one_connection() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
        let store = Arc::new(InMemoryDocumentStore::default());
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Jobseeker,
        };
        store.add_user(user.clone());
        let resolver = RedisSessionResolver::connect(redis::Client::open(url).unwrap(), store)
            .await
            .unwrap();

        let token = Uuid::new_v4().to_string();
        let mut conn = resolver.sessions.clone();
        let _: () = conn
            .set_ex(session_key(&token), user.id.to_string(), 60)
            .await
            .unwrap();

        let resolved = try_join_all((0..16).map(|_| resolver.resolve(&token)))
            .await
            .unwrap();
        assert!(resolved.iter().all(|caller| caller.id == user.id));
        assert!(matches!(
            resolver.resolve("no-such-token").await,
            Err(AppError::Unauthorized)
        ));
    }
}
