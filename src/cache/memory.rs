use crate::cache::FastTier;
use crate::model::CacheError;

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Instant,
}

impl Slot {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process fast tier. Expired entries are purged on every write and
/// dropped lazily on read; new keys are refused once `capacity` live
/// entries are held.
pub struct MemoryTier {
    entries: RwLock<HashMap<String, Slot>>,
    capacity: usize,
}

impl MemoryTier {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait::async_trait]
impl FastTier for MemoryTier {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(slot) if !slot.is_expired() => return Ok(Some(slot.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        debug!("Fast tier entry expired: {}", key);
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn setex(&self, key: &str, ttl: Duration, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, slot| !slot.is_expired());
        if entries.len() < before {
            debug!("Fast tier purged {} expired entries", before - entries.len());
        }

        if !entries.contains_key(key) && entries.len() >= self.capacity {
            return Err(CacheError::Full {
                capacity: self.capacity,
            });
        }
        let slot = Slot {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        entries.insert(key.to_string(), slot);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn returns_value_within_ttl() {
        let tier = MemoryTier::new(16);
        tier.setex("k", MINUTE, "v").await.unwrap();
        assert_eq!(tier.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn zero_ttl_expires_immediately() {
        let tier = MemoryTier::new(16);
        tier.setex("k", Duration::ZERO, "v").await.unwrap();
        assert_eq!(tier.get("k").await.unwrap(), None);
        assert_eq!(tier.len().await, 0);
    }

    #[tokio::test]
    async fn expired_keys_never_read_again_are_purged_on_write() {
        let tier = MemoryTier::new(16);
        for i in 0..1000 {
            tier.setex(&format!("addr-{}", i), Duration::ZERO, "{}").await.unwrap();
        }
        assert!(tier.len().await <= 1);
    }

    #[tokio::test]
    async fn full_tier_refuses_new_keys_but_updates_existing() {
        let tier = MemoryTier::new(2);
        tier.setex("a", MINUTE, "1").await.unwrap();
        tier.setex("b", MINUTE, "2").await.unwrap();

        let err = tier.setex("c", MINUTE, "3").await.unwrap_err();
        assert!(matches!(err, CacheError::Full { capacity: 2 }));
        tier.setex("a", MINUTE, "updated").await.unwrap();
        assert_eq!(tier.get("a").await.unwrap().as_deref(), Some("updated"));

        tier.delete("b").await.unwrap();
        tier.setex("c", MINUTE, "3").await.unwrap();
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let tier = MemoryTier::new(16);
        tier.setex("k", MINUTE, "v").await.unwrap();
        tier.delete("k").await.unwrap();
        tier.delete("k").await.unwrap();
        assert_eq!(tier.get("k").await.unwrap(), None);
    }
}
