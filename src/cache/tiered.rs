use crate::cache::{FastTier, PersistentTier};
use crate::model::StorageError;

use serde::de::IgnoredAny;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where a response body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    FastHit,
    PersistentHit,
    Fresh,
}

/// Read-through over both tiers. Fast tier failures degrade to the
/// persistent tier; persistent failures propagate.
pub struct TieredCache {
    fast: Arc<dyn FastTier>,
    persistent: Arc<dyn PersistentTier>,
    ttl: Duration,
}

fn is_valid_json(payload: &str) -> bool {
    serde_json::from_str::<IgnoredAny>(payload).is_ok()
}

impl TieredCache {
    pub fn new(fast: Arc<dyn FastTier>, persistent: Arc<dyn PersistentTier>, ttl: Duration) -> Self {
        Self {
            fast,
            persistent,
            ttl,
        }
    }

    /// Returns the cached body and the tier that answered, or `None` on a miss.
    pub async fn lookup(&self, key: &str) -> Result<Option<(String, CacheStatus)>, StorageError> {
        match self.fast.get(key).await {
            Ok(Some(body)) if is_valid_json(&body) => {
                info!("Fast cache hit: {}", key);
                return Ok(Some((body, CacheStatus::FastHit)));
            }
            Ok(Some(_)) => {
                warn!("Corrupt fast cache entry for {}, discarding", key);
                self.delete_fast(key).await;
            }
            Ok(None) => debug!("Fast cache miss: {}", key),
            Err(e) => warn!("Fast cache read failed for {}: {}", key, e),
        }

        let Some(entry) = self.persistent.get(key).await? else {
            info!("Cache miss: {}", key);
            return Ok(None);
        };
        if !is_valid_json(&entry.payload) {
            warn!("Corrupt persistent cache entry for {}, discarding", key);
            self.persistent.delete(key).await?;
            return Ok(None);
        }

        info!(
            "Persistent cache hit: {} (created {}, updated {})",
            key, entry.created_at, entry.updated_at
        );
        let body = entry.payload;
        if let Err(e) = self.fast.setex(key, self.ttl, &body).await {
            warn!("Fast cache backfill failed for {}: {}", key, e);
        }
        Ok(Some((body, CacheStatus::PersistentHit)))
    }

    /// Writes a freshly computed body to both tiers.
    pub async fn store(&self, key: &str, body: &str) -> Result<(), StorageError> {
        self.persistent.upsert(key, body).await?;
        if let Err(e) = self.fast.setex(key, self.ttl, body).await {
            warn!("Fast cache write failed for {}: {}", key, e);
        }
        Ok(())
    }

    pub async fn flush(&self, key: &str) -> Result<(), StorageError> {
        info!("Flushing cache for {}", key);
        self.delete_fast(key).await;
        self.persistent.delete(key).await
    }

    async fn delete_fast(&self, key: &str) {
        if let Err(e) = self.fast.delete(key).await {
            warn!("Fast cache delete failed for {}: {}", key, e);
        }
    }
}
