//! Thread-safe handle around [`Cache`]

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::cache::Cache;
use crate::clock::{Clock, MonotonicClock};
use crate::error::Result;
use crate::policy::EvictionPolicy;
use crate::stats::StatsSnapshot;

/// Cache shared between threads
///
/// Anything that can move an entry, flip a visited bit or move the SIEVE
/// hand takes the write lock, including `get`. Only `peek`, `contains`
/// and the size accessors share the read lock. Cloning is cheap and every
/// clone sees the same cache.
pub struct SharedCache<K, V, C = MonotonicClock> {
    inner: Arc<RwLock<Cache<K, V, C>>>,
}

impl<K, V, C> Clone for SharedCache<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedCache<K, V, MonotonicClock>
where
    K: Hash + Eq + Clone,
{
    /// Create a new shared cache
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of live entries (must be > 0)
    /// * `policy` - Eviction policy
    /// * `ttl` - Maximum entry age
    pub fn new(capacity: usize, policy: EvictionPolicy, ttl: Option<Duration>) -> Result<Self> {
        Ok(Self::from_cache(Cache::new(capacity, policy, ttl)?))
    }
}

impl<K, V, C> SharedCache<K, V, C> {
    /// Wrap an existing cache
    pub fn from_cache(cache: Cache<K, V, C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }
}

impl<K, V, C> SharedCache<K, V, C>
where
    K: Hash + Eq + Clone,
    V: Clone,
    C: Clock,
{
    /// Insert or overwrite a value
    pub fn insert(&self, key: K, value: V) -> Result<()> {
        self.inner.write().insert(key, value)
    }

    /// Get a clone of the value, recording the hit with the policy
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().get(key).cloned()
    }

    /// Get a clone of the value without changing its eviction state
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().peek(key).cloned()
    }

    /// Remove a key from the cache
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().remove(key)
    }

    /// Whether a live entry exists for `key`
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().contains(key)
    }

    /// Get current cache size
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// Get the eviction policy
    pub fn policy(&self) -> EvictionPolicy {
        self.inner.read().policy()
    }

    /// Copy of the current statistics
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.read().stats().snapshot()
    }

    /// Drop every entry and reset statistics
    pub fn clear(&self) {
        let mut cache = self.inner.write();
        cache.clear();
        cache.stats().reset();
    }

    /// Run [`Cache::check_invariants`] under the read lock
    pub fn check_invariants(&self) -> Result<()> {
        self.inner.read().check_invariants()
    }

    /// Run a closure with exclusive access to the cache
    pub fn with_cache<R>(&self, f: impl FnOnce(&mut Cache<K, V, C>) -> R) -> R {
        f(&mut self.inner.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_basic() {
        let cache = SharedCache::new(10, EvictionPolicy::Sieve, None).unwrap();

        cache.insert("a".to_string(), vec![1u8, 2, 3]).unwrap();

        assert_eq!(cache.get("a"), Some(vec![1, 2, 3]));
        assert!(cache.contains("a"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_clones_share_state() {
        let cache = SharedCache::new(2, EvictionPolicy::LeastRecentlyUsed, None).unwrap();
        let other = cache.clone();

        cache.insert(1u32, "one").unwrap();
        assert_eq!(other.peek(&1), Some("one"));
        assert_eq!(other.remove(&1), Some("one"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_eviction_through_wrapper() {
        let cache = SharedCache::new(2, EvictionPolicy::Sieve, None).unwrap();

        cache.insert("A", 1).unwrap();
        cache.insert("B", 2).unwrap();
        cache.get("A");
        cache.insert("C", 3).unwrap();

        assert!(!cache.contains("B"));
        assert_eq!(cache.stats().evictions, 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_clear_resets_stats() {
        let cache = SharedCache::new(2, EvictionPolicy::Sieve, None).unwrap();

        cache.insert(1u32, 1u32).unwrap();
        cache.get(&1);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats(), StatsSnapshot::default());
    }

    #[test]
    fn test_with_cache() {
        let cache = SharedCache::new(3, EvictionPolicy::Sieve, None).unwrap();

        cache.with_cache(|c| {
            c.insert(1u32, 10u32)?;
            c.insert(2, 20)
        })
        .unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.capacity(), 3);
        assert_eq!(cache.policy(), EvictionPolicy::Sieve);
    }
}
