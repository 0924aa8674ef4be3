use std::time::Duration;

use async_trait::async_trait;

/// Per-visitor key/value store
///
/// Values are opaque strings; structured state is stored as JSON by
/// [`super::SessionContext`]. A `ttl` of `None` means the entry lives as
/// long as the session stays active.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str, key: &str) -> Option<String>;

    async fn set(&self, session_id: &str, key: &str, value: String, ttl: Option<Duration>);

    async fn remove(&self, session_id: &str, key: &str);
}
