//! Cache store port: the host's key/value cache with per-entry expiry.

use async_trait::async_trait;

/// Key/value cache with per-entry expiry.
///
/// The store is best-effort: an entry may be evicted before its TTL
/// elapses, so callers must tolerate `get` returning nothing for a key
/// they wrote. Operations themselves never fail.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    /// Write an entry. `ttl_seconds = None` leaves the entry under the
    /// store's own maximum retention window.
    async fn put(&self, key: &str, value: String, ttl_seconds: Option<u64>);

    /// Removing an absent key is a no-op.
    async fn remove(&self, key: &str);
}
