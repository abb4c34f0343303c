//! In-memory cache store with per-entry expiry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::ports::{CacheStore, Clock};

/// Default maximum retention, matching the host cache's six-hour ceiling.
pub const DEFAULT_MAX_RETENTION_SECS: u64 = 21_600;

struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Cache store backed by a map, expiring entries against an injected clock.
///
/// Entries past their deadline are invisible to `get` and dropped lazily on
/// access. A `put` without TTL falls under the configured maximum
/// retention, the way the host cache treats untimed writes.
pub struct InMemoryCache {
    clock: Arc<dyn Clock>,
    max_retention_secs: u64,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_max_retention(clock, DEFAULT_MAX_RETENTION_SECS)
    }

    pub fn with_max_retention(clock: Arc<dyn Clock>, max_retention_secs: u64) -> Self {
        Self {
            clock,
            max_retention_secs,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > self.clock.now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, value: String, ttl_seconds: Option<u64>) {
        let ttl = ttl_seconds.unwrap_or(self.max_retention_secs);
        let expires_at = self.clock.now() + chrono::Duration::seconds(ttl as i64);
        self.entries
            .lock()
            .await
            .insert(key.to_string(), CacheEntry { value, expires_at });
    }

    async fn remove(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::ManualClock;
    use std::time::Duration;

    fn cache() -> (Arc<ManualClock>, InMemoryCache) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = InMemoryCache::new(clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let (clock, cache) = cache();
        cache.put("k", "v".to_string(), Some(10)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));

        clock.advance(Duration::from_secs(11));
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn zero_ttl_expires_immediately() {
        let (_clock, cache) = cache();
        cache.put("k", "v".to_string(), Some(0)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn missing_ttl_uses_max_retention() {
        let (clock, cache) = cache();
        cache.put("k", "v".to_string(), None).await;

        clock.advance(Duration::from_secs(DEFAULT_MAX_RETENTION_SECS - 1));
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));

        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (_clock, cache) = cache();
        cache.put("k", "v".to_string(), Some(10)).await;
        cache.remove("k").await;
        cache.remove("k").await;
        assert_eq!(cache.get("k").await, None);
    }
}
