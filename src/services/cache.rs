// src/services/cache.rs
// DOCUMENTATION: Response cache for place search endpoints
// PURPOSE: Serve repeated identical searches without calling LocationIQ

use async_trait::async_trait;
use fred::prelude::*;
use fred::types::Expiration;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// TTL key/value store for serialized responses
/// DOCUMENTATION: Backend failures are logged and reported as a miss,
/// a broken cache never fails a request
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    /// Store with the backend's default TTL
    async fn set(&self, key: &str, value: &str);

    /// Release backend connections at shutdown
    async fn close(&self) {}
}

/// Build a cache key: namespace:subject:method:path:sorted-query-params
/// DOCUMENTATION: Anonymous callers share the "anonymous" subject
pub fn build_cache_key(
    namespace: &str,
    subject: Option<&str>,
    method: &str,
    path: &str,
    query: &[(String, String)],
) -> String {
    let mut params: Vec<&(String, String)> = query.iter().collect();
    params.sort();

    let params = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    [
        namespace,
        subject.unwrap_or("anonymous"),
        &method.to_lowercase(),
        path,
        &params,
    ]
    .join(":")
}

/// Cache entry with expiration
#[derive(Clone, Debug)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// In-process cache with TTL
/// DOCUMENTATION: Used when CACHE_BACKEND=memory and by tests
pub struct MemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry<String>>>>,
    default_ttl: Duration,
}

impl MemoryCache {
    /// Create new cache with default TTL
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            default_ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Set cached value with custom TTL
    pub async fn set_with_ttl(&self, key: String, value: String, ttl: Duration) {
        let mut store = self.store.write().await;
        store.insert(key.clone(), CacheEntry::new(value, ttl));
        log::debug!("Cache SET for key: {} (TTL: {}s)", key, ttl.as_secs());
    }

    /// Clear expired entries
    pub async fn cleanup(&self) {
        let mut store = self.store.write().await;
        let before_count = store.len();
        store.retain(|_, entry| !entry.is_expired());
        let after_count = store.len();

        if before_count > after_count {
            log::info!(
                "Cache cleanup: removed {} expired entries ({} remaining)",
                before_count - after_count,
                after_count
            );
        }
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.read().await;

        match store.get(key) {
            Some(entry) if !entry.is_expired() => {
                log::debug!("Cache HIT for key: {}", key);
                Some(entry.data.clone())
            }
            Some(_) => {
                log::debug!("Cache EXPIRED for key: {}", key);
                None
            }
            None => {
                log::debug!("Cache MISS for key: {}", key);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) {
        self.set_with_ttl(key.to_string(), value.to_string(), self.default_ttl)
            .await;
    }
}

/// Start background cleanup task for the in-process backend
/// DOCUMENTATION: Periodically removes expired entries
pub fn start_cleanup_task(cache: Arc<MemoryCache>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            cache.cleanup().await;
        }
    });
}

/// Redis-backed cache
/// DOCUMENTATION: Values are stored with SET ... EX ttl
pub struct RedisCache {
    pool: Pool,
    ttl_seconds: i64,
}

impl RedisCache {
    /// Connect a small pool to the given redis:// URL
    pub async fn connect(url: &str, ttl_seconds: u64) -> Result<Self, fred::error::Error> {
        let config = Config::from_url(url)?;
        let pool = Pool::new(config, None, None, None, 4)?;

        pool.connect();
        pool.wait_for_connect().await?;

        log::info!("Connected to Redis at {}", url);
        Ok(Self {
            pool,
            ttl_seconds: ttl_seconds as i64,
        })
    }
}

#[async_trait]
impl ResponseCache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        match self.pool.get::<Option<String>, _>(key).await {
            Ok(Some(value)) => {
                log::debug!("Cache HIT for key: {}", key);
                Some(value)
            }
            Ok(None) => {
                log::debug!("Cache MISS for key: {}", key);
                None
            }
            Err(e) => {
                log::error!("Redis GET failed for key {}: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) {
        let result = self
            .pool
            .set::<(), _, _>(
                key,
                value,
                Some(Expiration::EX(self.ttl_seconds)),
                None,
                false,
            )
            .await;

        match result {
            Ok(()) => log::debug!("Cache SET for key: {} (TTL: {}s)", key, self.ttl_seconds),
            Err(e) => log::error!("Redis SET failed for key {}: {}", key, e),
        }
    }

    async fn close(&self) {
        if let Err(e) = self.pool.quit().await {
            log::warn!("Failed to close Redis pool cleanly: {}", e);
        }
    }
}
