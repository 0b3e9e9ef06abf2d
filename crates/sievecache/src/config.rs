//! Serializable cache configuration

use std::hash::Hash;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::policy::EvictionPolicy;
use crate::shared::SharedCache;

/// Cache settings, loadable from any serde format
///
/// ```json
/// { "capacity": 1024, "policy": "sieve", "ttl_ms": 30000 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub capacity: usize,

    /// Eviction policy
    #[serde(default)]
    pub policy: EvictionPolicy,

    /// Entry time-to-live in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_ms: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            policy: EvictionPolicy::default(),
            ttl_ms: None,
        }
    }
}

impl CacheConfig {
    /// Config with the given capacity and policy, no TTL
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            capacity,
            policy,
            ttl_ms: None,
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ms = Some(ttl.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    /// TTL as a [`Duration`]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }

    /// Check the settings without building anything
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        Ok(())
    }

    /// Build a single-threaded cache
    pub fn build<K, V>(&self) -> Result<Cache<K, V>>
    where
        K: Hash + Eq + Clone,
    {
        self.validate()?;
        Cache::new(self.capacity, self.policy, self.ttl())
    }

    /// Build a cache that can be shared between threads
    pub fn build_shared<K, V>(&self) -> Result<SharedCache<K, V>>
    where
        K: Hash + Eq + Clone,
    {
        self.validate()?;
        SharedCache::new(self.capacity, self.policy, self.ttl())
    }
}
