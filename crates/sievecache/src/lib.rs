//! # sievecache
//!
//! Bounded in-memory key-value cache with pluggable eviction.
//!
//! ## Architecture
//! - **HashMap**: AHash table from key to arena handle (O(1))
//! - **Ordered list**: index-linked doubly-linked list in a slot arena (O(1))
//! - **Policy**: `LeastRecentlyUsed` or `Sieve`, dispatched by `match`
//! - **TTL**: checked lazily on access against a pluggable [`Clock`]
//! - **SharedCache**: `RwLock` wrapper for multi-threaded callers
//!
//! ## Example
//! ```
//! use sievecache::{Cache, EvictionPolicy};
//!
//! let mut cache = Cache::new(2, EvictionPolicy::Sieve, None).unwrap();
//! cache.insert("A", 1).unwrap();
//! cache.insert("B", 2).unwrap();
//! cache.get("A");
//! cache.insert("C", 3).unwrap();
//!
//! assert!(cache.contains("A"));
//! assert!(!cache.contains("B"));
//! ```

#![warn(missing_docs)]

mod cache;
mod clock;
mod config;
mod error;
mod list;
mod policy;
mod shared;
mod stats;

pub use cache::Cache;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::CacheConfig;
pub use error::{Error, Result};
pub use policy::EvictionPolicy;
pub use shared::SharedCache;
pub use stats::{CacheStats, StatsSnapshot};
