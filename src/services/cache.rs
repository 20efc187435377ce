use crate::models::ContentCategory;
use crate::services::clock::Clock;
use crate::services::storage::{LocalStorage, StorageError, StorageKeys};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A cached response with the time it was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedItem {
    pub data: Value,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Two-tier response cache
///
/// L1 is an in-memory moka cache for the current process, L2 is the map
/// persisted under `@moy_risk_api_cache` so entries survive restarts.
/// Freshness is always decided from the stored timestamp against the
/// injected clock; an entry older than the TTL is dropped from both tiers.
pub struct ResponseCache {
    storage: Arc<LocalStorage>,
    l1_cache: moka::future::Cache<String, CachedItem>,
    clock: Arc<dyn Clock>,
    ttl_millis: i64,
}

impl ResponseCache {
    /// Create a new response cache
    pub fn new(storage: Arc<LocalStorage>, clock: Arc<dyn Clock>, l1_size: u64, ttl_secs: u64) -> Self {
        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            storage,
            l1_cache,
            clock,
            ttl_millis: (ttl_secs as i64).saturating_mul(1000),
        }
    }

    fn is_fresh(&self, item: &CachedItem) -> bool {
        self.clock.now_millis() - item.timestamp <= self.ttl_millis
    }

    /// Persisted entries; an unreadable map counts as empty and is replaced on the next `set`
    async fn load_persisted(&self) -> Result<HashMap<String, CachedItem>, CacheError> {
        match self.storage.get_json(StorageKeys::API_CACHE).await {
            Ok(persisted) => Ok(persisted.unwrap_or_default()),
            Err(StorageError::Serialization(e)) => {
                tracing::warn!("Discarding unreadable response cache: {}", e);
                Ok(HashMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a fresh value (L1 first, then L2)
    pub async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        if let Some(item) = self.l1_cache.get(key).await {
            if self.is_fresh(&item) {
                tracing::trace!("L1 cache hit: {}", key);
                return Ok(Some(item.data));
            }
            self.l1_cache.invalidate(key).await;
        }

        let mut persisted = self.load_persisted().await?;
        match persisted.get(key) {
            Some(item) if self.is_fresh(item) => {
                tracing::trace!("L2 cache hit: {}", key);
                let item = item.clone();
                let data = item.data.clone();
                self.l1_cache.insert(key.to_string(), item).await;
                Ok(Some(data))
            }
            Some(_) => {
                tracing::debug!("Cache entry expired: {}", key);
                persisted.remove(key);
                self.storage.set_json(StorageKeys::API_CACHE, &persisted).await?;
                Ok(None)
            }
            None => {
                tracing::trace!("Cache miss: {}", key);
                Ok(None)
            }
        }
    }

    /// Store a value in both tiers, stamped with the current time
    pub async fn set(&self, key: &str, data: Value) -> Result<(), CacheError> {
        let item = CachedItem {
            data,
            timestamp: self.clock.now_millis(),
        };

        self.l1_cache.insert(key.to_string(), item.clone()).await;

        let mut persisted = self.load_persisted().await?;
        persisted.insert(key.to_string(), item);
        self.storage.set_json(StorageKeys::API_CACHE, &persisted).await?;

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Drop every entry from both tiers
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.l1_cache.invalidate_all();
        self.storage.remove_item(StorageKeys::API_CACHE).await?;
        tracing::debug!("Response cache cleared");
        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for educational content
    pub fn education(category: Option<ContentCategory>) -> String {
        format!("education_{}", category.map(|c| c.as_str()).unwrap_or("all"))
    }
}
