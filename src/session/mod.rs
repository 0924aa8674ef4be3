//! Visitor sessions
//!
//! Every visitor gets an opaque session id (cookie). Redirect-loop flags,
//! download gate and quiz state live in a [`SessionStore`] keyed by that id.

mod memory;
mod store;

use std::fmt;
use std::future::{Ready, ready};
use std::sync::Arc;
use std::time::Duration;

use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;
use uuid::Uuid;

pub use memory::MemorySessionStore;
pub use store::SessionStore;

/// Opaque visitor id carried in the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept only well-formed ids; anything else gets a fresh session
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(|u| Self(u.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A store bound to one session id, handed to handlers and services
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    id: SessionId,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>, id: SessionId) -> Self {
        Self { store, id }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub async fn get_string(&self, key: &str) -> Option<String> {
        self.store.get(self.id.as_str(), key).await
    }

    pub async fn set_string(&self, key: &str, value: impl Into<String>, ttl: Option<Duration>) {
        self.store
            .set(self.id.as_str(), key, value.into(), ttl)
            .await;
    }

    /// Corrupt entries are dropped and read as absent
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_string(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unreadable session value '{}': {}", key, e);
                self.remove(key).await;
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_string(key, raw, ttl).await,
            Err(e) => warn!("Failed to serialize session value '{}': {}", key, e),
        }
    }

    pub async fn remove(&self, key: &str) {
        self.store.remove(self.id.as_str(), key).await;
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<SessionContext>()
                .cloned()
                .ok_or_else(|| {
                    actix_web::error::ErrorInternalServerError("session middleware not installed")
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        n: u32,
    }

    fn context() -> SessionContext {
        let store: Arc<dyn SessionStore> =
            Arc::new(MemorySessionStore::new(100, Duration::from_secs(60)));
        SessionContext::new(store, SessionId::generate())
    }

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::generate();
        assert_eq!(SessionId::parse(id.as_str()), Some(id));
        assert!(SessionId::parse("not-a-session").is_none());
        assert!(SessionId::parse("").is_none());
    }

    #[tokio::test]
    async fn test_json_round_trip_and_corrupt_value() {
        let ctx = context();
        ctx.set_json("sample", &Sample { n: 3 }, None).await;
        assert_eq!(ctx.get_json::<Sample>("sample").await, Some(Sample { n: 3 }));

        ctx.set_string("sample", "{broken", None).await;
        assert_eq!(ctx.get_json::<Sample>("sample").await, None);
        assert!(ctx.get_string("sample").await.is_none());
    }
}
