//! Cache for rendered home listing pages.
//!
//! Entries expire by TTL only. Writes to posts never touch the cache; the one
//! way to drop entries early is [`ListingCache::clear`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use yatube_common::{AppError, AppResult};

/// Storage for cached listing pages.
#[async_trait::async_trait]
pub trait ListingCache: Send + Sync {
    /// Look up a live entry.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store an entry that expires after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()>;

    /// Drop every entry.
    async fn clear(&self) -> AppResult<()>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-process cache, private to one server instance.
#[derive(Clone, Default)]
pub struct MemoryListingCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryListingCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait::async_trait]
impl ListingCache for MemoryListingCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

fn generation_key(prefix: &str) -> String {
    format!("{prefix}:index:generation")
}

fn entry_key(prefix: &str, generation: i64, key: &str) -> String {
    format!("{prefix}:index:{generation}:{key}")
}

/// Redis-backed cache shared by every server instance.
///
/// Keys carry a generation number. Clearing bumps the generation, so older
/// entries become unreachable at once and are left to expire.
#[derive(Clone)]
pub struct RedisListingCache {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisListingCache {
    /// Create a cache using keys under `prefix`.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
        }
    }

    async fn generation(&self) -> AppResult<i64> {
        let generation: Option<i64> = self
            .redis
            .get(generation_key(&self.prefix))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(generation.unwrap_or(0))
    }
}

#[async_trait::async_trait]
impl ListingCache for RedisListingCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let generation = self.generation().await?;
        self.redis
            .get(entry_key(&self.prefix, generation, key))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> AppResult<()> {
        let generation = self.generation().await?;
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1);

        self.redis
            .set::<(), _, _>(
                entry_key(&self.prefix, generation, key),
                value,
                Some(Expiration::EX(ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        debug!(key = %key, generation, "Cached listing page");
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        let generation: i64 = self
            .redis
            .incr(generation_key(&self.prefix))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        info!(generation, "Advanced listing cache generation");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(1200);

    #[tokio::test]
    async fn test_memory_get_set() {
        let cache = MemoryListingCache::new();
        assert_eq!(cache.get("page:1").await.unwrap(), None);

        cache.set("page:1", "one".to_string(), TTL).await.unwrap();
        assert_eq!(cache.get("page:1").await.unwrap().as_deref(), Some("one"));
        assert_eq!(cache.get("page:2").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_entries_expire() {
        let cache = MemoryListingCache::new();
        cache.set("page:1", "one".to_string(), TTL).await.unwrap();

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert!(cache.get("page:1").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("page:1").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_set_prunes_expired() {
        let cache = MemoryListingCache::new();
        cache.set("page:1", "one".to_string(), TTL).await.unwrap();
        tokio::time::advance(TTL).await;

        cache.set("page:2", "two".to_string(), TTL).await.unwrap();
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_clear() {
        let cache = MemoryListingCache::new();
        cache.set("page:1", "one".to_string(), TTL).await.unwrap();
        cache.set("page:2", "two".to_string(), TTL).await.unwrap();

        cache.clear().await.unwrap();

        assert_eq!(cache.len().await, 0);
        assert!(cache.get("page:1").await.unwrap().is_none());
    }

    #[test]
    fn test_redis_keys() {
        assert_eq!(generation_key("yatube"), "yatube:index:generation");
        assert_eq!(entry_key("yatube", 3, "page:2"), "yatube:index:3:page:2");
    }
}
