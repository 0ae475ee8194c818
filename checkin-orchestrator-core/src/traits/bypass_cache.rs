//! Bypass credential cache abstract Trait

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::error::CoreResult;

/// Fixed time-to-live of a cache entry.
pub const BYPASS_COOKIE_TTL_HOURS: i64 = 24;

/// Cookie map stored per cache key.
pub type CookieMap = HashMap<String, String>;

/// TTL-keyed store of anti-bot bypass cookies.
///
/// Keys are derived from the provider identity (plus the account domain for
/// template providers). An expired entry is indistinguishable from an
/// absent one: both are a miss and require a fresh fetch. There is no
/// cross-process locking; two concurrent misses for the same key may both
/// trigger a fetch, which is safe because `store` is an idempotent
/// overwrite (accepted limitation — accounts run sequentially, so true
/// concurrency is rare).
#[async_trait]
pub trait BypassCookieCache: Send + Sync {
    /// Get the cookies for `key`, unless absent or expired.
    async fn lookup(&self, key: &str) -> CoreResult<Option<CookieMap>>;

    /// Upsert the cookies for `key`, resetting the TTL to 24 h from now.
    async fn store(&self, key: &str, cookies: &CookieMap) -> CoreResult<()>;

    /// Delete the entry for `key` unconditionally; no-op when absent.
    async fn invalidate(&self, key: &str) -> CoreResult<()>;

    /// Remove expired entries, for storage hygiene only — correctness never
    /// depends on it. Returns the number of entries removed.
    async fn cleanup_expired(&self) -> CoreResult<usize>;
}

struct CacheEntry {
    cookies: CookieMap,
    expires_at: DateTime<Utc>,
}

/// In-memory bypass cookie cache
///
/// Default implementation, available on all platforms.
pub struct InMemoryBypassCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl InMemoryBypassCache {
    /// Create a cache with the standard 24 h TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(BYPASS_COOKIE_TTL_HOURS))
    }

    /// Create a cache with a custom TTL (used by tests to force expiry).
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }
}

impl Default for InMemoryBypassCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BypassCookieCache for InMemoryBypassCache {
    async fn lookup(&self, key: &str) -> CoreResult<Option<CookieMap>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.cookies.clone()))
    }

    async fn store(&self, key: &str, cookies: &CookieMap) -> CoreResult<()> {
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                cookies: cookies.clone(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn cleanup_expired(&self) -> CoreResult<usize> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookies(pairs: &[(&str, &str)]) -> CookieMap {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn store_then_lookup() {
        let cache = InMemoryBypassCache::new();
        cache
            .store("anyrouter", &cookies(&[("acw_tc", "abc")]))
            .await
            .unwrap();

        let found = cache.lookup("anyrouter").await.unwrap().unwrap();
        assert_eq!(found.get("acw_tc").map(String::as_str), Some("abc"));
    }

    #[tokio::test]
    async fn missing_key_is_miss() {
        let cache = InMemoryBypassCache::new();
        assert!(cache.lookup("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_miss() {
        let cache = InMemoryBypassCache::with_ttl(Duration::zero());
        cache
            .store("anyrouter", &cookies(&[("acw_tc", "abc")]))
            .await
            .unwrap();

        assert!(cache.lookup("anyrouter").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_overwrites_and_resets() {
        let cache = InMemoryBypassCache::new();
        cache
            .store("key", &cookies(&[("acw_tc", "old")]))
            .await
            .unwrap();
        cache
            .store("key", &cookies(&[("acw_tc", "new")]))
            .await
            .unwrap();

        let found = cache.lookup("key").await.unwrap().unwrap();
        assert_eq!(found.get("acw_tc").map(String::as_str), Some("new"));
    }

    #[tokio::test]
    async fn invalidate_is_noop_when_absent() {
        let cache = InMemoryBypassCache::new();
        cache.invalidate("ghost").await.unwrap();

        cache
            .store("key", &cookies(&[("acw_tc", "abc")]))
            .await
            .unwrap();
        cache.invalidate("key").await.unwrap();
        assert!(cache.lookup("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cleanup_counts_only_expired() {
        let expiring = InMemoryBypassCache::with_ttl(Duration::zero());
        expiring
            .store("a", &cookies(&[("acw_tc", "1")]))
            .await
            .unwrap();
        expiring
            .store("b", &cookies(&[("acw_tc", "2")]))
            .await
            .unwrap();
        assert_eq!(expiring.cleanup_expired().await.unwrap(), 2);
        assert_eq!(expiring.cleanup_expired().await.unwrap(), 0);

        let fresh = InMemoryBypassCache::new();
        fresh
            .store("a", &cookies(&[("acw_tc", "1")]))
            .await
            .unwrap();
        assert_eq!(fresh.cleanup_expired().await.unwrap(), 0);
        assert!(fresh.lookup("a").await.unwrap().is_some());
    }
}
