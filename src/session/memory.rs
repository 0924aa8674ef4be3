use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use tracing::debug;

use super::SessionStore;
use crate::config::SessionConfig;

type EntryKey = (String, String);

#[derive(Clone, Debug)]
struct SessionValue {
    value: String,
    ttl: Option<Duration>,
}

/// 每个条目独立的过期策略
///
/// Entries with an explicit TTL expire after it regardless of reads.
/// Entries without one expire after `idle_ttl` of inactivity.
struct SessionEntryExpiry {
    idle_ttl: Duration,
}

impl Expiry<EntryKey, SessionValue> for SessionEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &EntryKey,
        value: &SessionValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl.unwrap_or(self.idle_ttl))
    }

    fn expire_after_read(
        &self,
        _key: &EntryKey,
        value: &SessionValue,
        _read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        match value.ttl {
            Some(_) => duration_until_expiry,
            None => Some(self.idle_ttl),
        }
    }

    fn expire_after_update(
        &self,
        _key: &EntryKey,
        value: &SessionValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl.unwrap_or(self.idle_ttl))
    }
}

/// In-process session store. Nothing survives a restart.
pub struct MemorySessionStore {
    inner: Cache<EntryKey, SessionValue>,
}

impl MemorySessionStore {
    pub fn new(max_capacity: u64, idle_ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(SessionEntryExpiry { idle_ttl })
            .build();

        debug!(
            "MemorySessionStore initialized with max capacity: {}, idle TTL: {}s",
            max_capacity,
            idle_ttl.as_secs()
        );
        Self { inner }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.max_capacity,
            Duration::from_secs(config.idle_ttl_secs),
        )
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str, key: &str) -> Option<String> {
        self.inner
            .get(&(session_id.to_string(), key.to_string()))
            .await
            .map(|v| v.value)
    }

    async fn set(&self, session_id: &str, key: &str, value: String, ttl: Option<Duration>) {
        self.inner
            .insert(
                (session_id.to_string(), key.to_string()),
                SessionValue { value, ttl },
            )
            .await;
    }

    async fn remove(&self, session_id: &str, key: &str) {
        self.inner
            .invalidate(&(session_id.to_string(), key.to_string()))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_are_scoped_per_session() {
        let store = MemorySessionStore::new(100, Duration::from_secs(60));
        store.set("a", "k", "1".into(), None).await;
        store.set("b", "k", "2".into(), None).await;

        assert_eq!(store.get("a", "k").await.as_deref(), Some("1"));
        assert_eq!(store.get("b", "k").await.as_deref(), Some("2"));

        store.remove("a", "k").await;
        assert!(store.get("a", "k").await.is_none());
        assert_eq!(store.get("b", "k").await.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_explicit_ttl_expires_entry() {
        let store = MemorySessionStore::new(100, Duration::from_secs(60));
        store
            .set("s", "short", "x".into(), Some(Duration::from_millis(50)))
            .await;
        store.set("s", "long", "y".into(), None).await;

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(store.get("s", "short").await.is_none());
        assert_eq!(store.get("s", "long").await.as_deref(), Some("y"));
    }
}
