// Two-tier report cache: a volatile TTL tier in front of a persistent store.

pub mod memory;
pub mod tiered;

pub use memory::MemoryTier;
pub use tiered::{CacheStatus, TieredCache};

use crate::model::{CacheEntry, CacheError, StorageError};
use std::time::Duration;

/// Volatile key/value tier with per-entry expiry.
#[async_trait::async_trait]
pub trait FastTier: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn setex(&self, key: &str, ttl: Duration, value: &str) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Durable tier. Entries never expire.
#[async_trait::async_trait]
pub trait PersistentTier: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, StorageError>;
    async fn upsert(&self, key: &str, payload: &str) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
