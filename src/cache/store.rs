//! TTL Cache Module
//!
//! Main cache engine combining the bounded LRU map with lazy TTL expiration.

use tracing::{debug, warn};

use crate::cache::{
    BoundedMap, CacheStats, CacheValue, ItemStore, Lookup, StatsRecorder, TtlItem,
};
use crate::config::Config;
use crate::error::Result;

// == TTL Cache ==
/// Bounded cache with LRU eviction and per-item TTL.
///
/// Expired items are never swept in the background; they are dropped when an access
/// finds them stale. Wrap it in a [`Cache`](crate::cache::Cache) for the forgiving
/// key-validating interface.
#[derive(Debug)]
pub struct TtlCache {
    /// Items in LRU order
    items: BoundedMap<String, TtlItem<CacheValue>>,
    /// Performance statistics
    stats: StatsRecorder,
    /// TTL in milliseconds applied to newly inserted items
    default_ttl_ms: i64,
}

impl TtlCache {
    // == Constructor ==
    /// Creates a new TtlCache with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries the cache can hold, must be > 0
    /// * `default_ttl_ms` - TTL in milliseconds for new items, `<= 0` disables expiry
    pub fn new(capacity: usize, default_ttl_ms: i64) -> Result<Self> {
        Ok(Self {
            items: BoundedMap::new(capacity)?,
            stats: StatsRecorder::new(),
            default_ttl_ms,
        })
    }

    /// Creates a durable cache from the configured capacity and default TTL.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.capacity, config.default_ttl_ms)
    }

    /// Creates a store whose items never expire, as used for request-scoped storage.
    pub fn transient(capacity: usize) -> Result<Self> {
        Self::new(capacity, 0)
    }

    pub fn default_ttl_ms(&self) -> i64 {
        self.default_ttl_ms
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Stores a value with an explicit TTL, replacing any existing item and its TTL.
    #[cfg(test)]
    pub(crate) fn set_with_ttl(&self, key: &str, value: CacheValue, ttl_ms: i64) {
        match self.items.set(key.to_string(), TtlItem::new(value, ttl_ms)) {
            Ok(Some(evicted)) => self.record_eviction(&evicted),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Rejected cache write"),
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.items.len())
    }

    // == Length ==
    /// Returns the number of stored items, including expired ones not yet accessed.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshot of the stored keys, in unspecified order.
    pub fn keys(&self) -> Vec<String> {
        self.items.keys()
    }

    fn record_eviction(&self, key: &str) {
        debug!(key, "Evicted entry to stay within capacity");
        self.stats.record_eviction();
    }
}

impl ItemStore for TtlCache {
    fn get_item(&self, key: &str) -> Option<CacheValue> {
        match self.items.get_fresh(key, TtlItem::is_expired) {
            Lookup::Hit(item) => {
                self.stats.record_hit();
                Some(item.into_value())
            }
            Lookup::Stale => {
                debug!(key, "Dropped expired entry on access");
                self.stats.record_expiration();
                None
            }
            Lookup::Missing => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn set_item(&self, key: &str, value: CacheValue) {
        let ttl_ms = self.default_ttl_ms;
        let result = self.items.upsert(
            key.to_string(),
            value,
            |item, value| item.set(value),
            |value| TtlItem::new(value, ttl_ms),
        );
        match result {
            Ok(Some(evicted)) => self.record_eviction(&evicted),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Rejected cache write"),
        }
    }

    fn remove_item(&self, key: &str) -> Option<CacheValue> {
        self.items.take(key).map(TtlItem::into_value)
    }

    fn contains_item(&self, key: &str) -> bool {
        self.items
            .peek_with(key, |item| !item.is_expired())
            .unwrap_or(false)
    }

    fn clear_items(&self) {
        self.items.clear();
    }
}
