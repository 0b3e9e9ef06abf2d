//! Bounded cache combining a hash table, the ordered list and a policy

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use ahash::RandomState;
use tracing::{debug, error};

use crate::clock::{Clock, MonotonicClock};
use crate::error::{Error, Result};
use crate::list::{NodeId, OrderedList};
use crate::policy::EvictionPolicy;
use crate::stats::CacheStats;

/// Fixed-capacity cache with LRU or SIEVE eviction and optional TTL.
///
/// The table maps each live key to an arena handle; the list owns the
/// entries. Both always hold the same number of entries, and never more
/// than `capacity`.
///
/// Expired entries are dropped lazily, the next time `get` or `remove`
/// finds them. Nothing runs in the background.
pub struct Cache<K, V, C = MonotonicClock> {
    table: HashMap<K, NodeId, RandomState>,
    order: OrderedList<K, V>,
    policy: EvictionPolicy,
    capacity: usize,
    ttl: Option<Duration>,
    clock: C,
    stats: CacheStats,
}

impl<K, V> Cache<K, V, MonotonicClock>
where
    K: Hash + Eq + Clone,
{
    /// Create a new cache
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of live entries (must be > 0)
    /// * `policy` - Eviction policy
    /// * `ttl` - Maximum entry age, or `None` to keep entries until evicted
    ///
    /// # Returns
    /// * `Result<Cache>` - `Error::InvalidCapacity` if `capacity == 0`
    pub fn new(capacity: usize, policy: EvictionPolicy, ttl: Option<Duration>) -> Result<Self> {
        Self::with_clock(capacity, policy, ttl, MonotonicClock)
    }
}

impl<K, V, C> Cache<K, V, C>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    /// Create a new cache reading time from `clock`
    pub fn with_clock(
        capacity: usize,
        policy: EvictionPolicy,
        ttl: Option<Duration>,
        clock: C,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }

        // A full cache reserves one slot before evicting
        let slots = capacity.saturating_add(1);
        Ok(Self {
            table: HashMap::with_capacity_and_hasher(slots, RandomState::new()),
            order: OrderedList::with_capacity(slots),
            policy,
            capacity,
            ttl,
            clock,
            stats: CacheStats::new(),
        })
    }

    /// Insert or overwrite a value.
    ///
    /// Overwriting refreshes the entry's TTL. Inserting a new key into a
    /// full cache evicts one entry first.
    ///
    /// # Returns
    /// * `Result<()>` - `Error::AllocationFailure` if room for a new entry
    ///   could not be reserved; the cache is left untouched
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let now = self.clock.now();

        if let Some(&id) = self.table.get(&key) {
            self.policy
                .insert(&mut self.order, Some(id), key, value, now);
            return Ok(());
        }

        self.table.try_reserve(1)?;
        self.order.try_reserve_one()?;

        if self.table.len() >= self.capacity {
            self.evict_one();
        }

        if let Some(id) = self
            .policy
            .insert(&mut self.order, None, key.clone(), value, now)
        {
            self.table.insert(key, id);
            self.stats.record_insert();
        }
        Ok(())
    }

    /// Get a value from the cache, recording the hit with the policy
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&id) = self.table.get(key) else {
            self.stats.record_miss();
            return None;
        };

        if self.is_expired(id, self.clock.now()) {
            self.expire(key, id);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.policy.touch(&mut self.order, Some(id))
    }

    /// Get a value without changing its eviction state
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.table.get(key)?;
        if self.is_expired(id, self.clock.now()) {
            return None;
        }
        self.order.get(id).map(|entry| &entry.value)
    }

    /// Remove a key from the cache.
    ///
    /// Returns `None` if the key was absent or had already expired.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.table.remove(key)?;
        let expired = self.is_expired(id, self.clock.now());
        let entry = self.order.remove(id)?;
        if expired {
            self.stats.record_expiration();
            None
        } else {
            Some(entry.value)
        }
    }

    /// Whether a live (unexpired) entry exists for `key`
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.table.get(key) {
            Some(&id) => !self.is_expired(id, self.clock.now()),
            None => false,
        }
    }

    /// Number of entries held, including expired ones not yet dropped
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the eviction policy
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Get the configured TTL
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.table.clear();
        self.order.clear();
    }

    /// Verify table/list agreement, link symmetry, cursor validity and the
    /// capacity bound.
    pub fn check_invariants(&self) -> Result<()> {
        self.order.check_links()?;

        if self.table.len() != self.order.len() {
            return Err(Error::Invariant(format!(
                "table holds {} keys, list holds {} entries",
                self.table.len(),
                self.order.len()
            )));
        }
        if self.table.len() > self.capacity {
            return Err(Error::Invariant(format!(
                "{} entries exceed capacity {}",
                self.table.len(),
                self.capacity
            )));
        }
        for (key, &id) in &self.table {
            match self.order.get(id) {
                Some(entry) if entry.key == *key => {}
                _ => {
                    return Err(Error::Invariant(format!(
                        "table handle {:?} does not resolve to its key",
                        id
                    )))
                }
            }
        }
        Ok(())
    }

    fn is_expired(&self, id: NodeId, now: Instant) -> bool {
        match (self.ttl, self.order.get(id)) {
            (Some(ttl), Some(entry)) => now.saturating_duration_since(entry.created_at) > ttl,
            _ => false,
        }
    }

    fn expire<Q>(&mut self, key: &Q, id: NodeId)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(key);
        self.order.remove(id);
        self.stats.record_expiration();
        debug!(policy = %self.policy, len = self.table.len(), "expired cache entry");
    }

    fn evict_one(&mut self) {
        let victim = self
            .policy
            .evict(&mut self.order)
            .and_then(|id| self.order.remove(id));

        let Some(entry) = victim else {
            error!(
                policy = %self.policy,
                len = self.table.len(),
                list_len = self.order.len(),
                capacity = self.capacity,
                "eviction found no victim in a full cache"
            );
            panic!(
                "{} eviction found no victim with {} of {} entries",
                self.policy,
                self.table.len(),
                self.capacity
            );
        };

        self.table.remove(&entry.key);
        self.stats.record_eviction();
        debug!(policy = %self.policy, len = self.table.len(), "evicted cache entry");
    }
}
