//! Eviction policies
//!
//! Both policies share one contract over the [`OrderedList`]:
//!
//! - **LeastRecentlyUsed**: new and touched entries go to the back, the
//!   victim is always the front.
//! - **Sieve**: new entries go to the front unvisited, hits only set the
//!   visited bit, and a persistent hand walks from the back towards the
//!   front clearing visited bits until it finds an unvisited victim.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::list::{Entry, NodeId, OrderedList};

/// Eviction strategy used when the cache is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EvictionPolicy {
    /// Evict the entry that was read or written longest ago
    #[serde(rename = "lru", alias = "least-recently-used")]
    LeastRecentlyUsed,

    /// SIEVE: lazy promotion with a visited bit and a sweeping hand
    #[default]
    #[serde(rename = "sieve")]
    Sieve,
}

impl EvictionPolicy {
    /// Link a new entry, or overwrite an existing one.
    ///
    /// Returns the handle of a newly created entry so the caller can
    /// register it; returns `None` when `existing` was updated in place.
    pub(crate) fn insert<K, V>(
        self,
        list: &mut OrderedList<K, V>,
        existing: Option<NodeId>,
        key: K,
        value: V,
        now: Instant,
    ) -> Option<NodeId> {
        if let Some(id) = existing {
            if let Some(entry) = list.get_mut(id) {
                entry.value = value;
                entry.created_at = now;
                if self == EvictionPolicy::Sieve {
                    entry.visited = true;
                }
            }
            if self == EvictionPolicy::LeastRecentlyUsed {
                list.move_to_back(id);
            }
            return None;
        }

        let entry = Entry::new(key, value, now);
        let id = match self {
            EvictionPolicy::LeastRecentlyUsed => list.push_back(entry),
            EvictionPolicy::Sieve => list.push_front(entry),
        };
        Some(id)
    }

    /// Record a hit and return the value.
    pub(crate) fn touch<K, V>(
        self,
        list: &mut OrderedList<K, V>,
        existing: Option<NodeId>,
    ) -> Option<&V> {
        let id = existing?;
        match self {
            EvictionPolicy::LeastRecentlyUsed => list.move_to_back(id),
            EvictionPolicy::Sieve => {
                if let Some(entry) = list.get_mut(id) {
                    entry.visited = true;
                }
            }
        }
        list.get(id).map(|entry| &entry.value)
    }

    /// Pick a victim. The caller unlinks it.
    ///
    /// Under SIEVE the hand is left on the victim's predecessor, so the
    /// next call resumes from there. At most two passes are needed since
    /// every visited bit seen on the first pass is cleared.
    pub(crate) fn evict<K, V>(self, list: &mut OrderedList<K, V>) -> Option<NodeId> {
        match self {
            EvictionPolicy::LeastRecentlyUsed => list.front(),
            EvictionPolicy::Sieve => {
                let mut hand = list.cursor().or_else(|| list.back())?;
                for _ in 0..=2 * list.len() {
                    let visited = list.get(hand)?.visited;
                    if !visited {
                        list.set_cursor(list.prev(hand));
                        return Some(hand);
                    }
                    if let Some(entry) = list.get_mut(hand) {
                        entry.visited = false;
                    }
                    trace!(slot = ?hand, "sieve hand cleared visited bit");
                    hand = list.prev(hand).or_else(|| list.back())?;
                }
                None
            }
        }
    }

    /// Short lowercase name, as accepted by [`FromStr`]
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::LeastRecentlyUsed => "lru",
            EvictionPolicy::Sieve => "sieve",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" | "least-recently-used" => Ok(EvictionPolicy::LeastRecentlyUsed),
            "sieve" => Ok(EvictionPolicy::Sieve),
            other => Err(format!("unknown eviction policy '{}'", other)),
        }
    }
}
