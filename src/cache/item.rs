//! TTL Item Module
//!
//! Defines the value holder stored by the TTL cache.

use std::time::{SystemTime, UNIX_EPOCH};

// == TTL Item ==
/// A stored value together with its TTL and the time of the last write.
#[derive(Debug, Clone)]
pub struct TtlItem<V> {
    /// The stored value
    value: V,
    /// Time to live in milliseconds, `<= 0` = never expires
    ttl_ms: i64,
    /// Timestamp of the last write (Unix milliseconds)
    last_updated: u64,
}

impl<V> TtlItem<V> {
    // == Constructor ==
    /// Creates a new item stamped with the current time.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_ms` - TTL in milliseconds, zero or negative disables expiry
    pub fn new(value: V, ttl_ms: i64) -> Self {
        Self {
            value,
            ttl_ms,
            last_updated: current_timestamp_ms(),
        }
    }

    // == Set ==
    /// Replaces the value and refreshes the write timestamp. The TTL is kept.
    pub fn set(&mut self, value: V) {
        self.value = value;
        self.last_updated = current_timestamp_ms();
    }

    /// Returns the stored value. Reading never refreshes the timestamp.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the item and returns its value.
    pub fn into_value(self) -> V {
        self.value
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    pub fn last_updated(&self) -> u64 {
        self.last_updated
    }

    // == Is Expired ==
    /// Checks if the item has outlived its TTL.
    ///
    /// An item expires once strictly more than `ttl_ms` milliseconds have passed since the
    /// last write. Items with `ttl_ms <= 0` never expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`is_expired`](Self::is_expired) against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        if self.ttl_ms <= 0 {
            return false;
        }
        now_ms.saturating_sub(self.last_updated) > self.ttl_ms as u64
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if the item never expires.
    ///
    /// # Returns
    /// - `Some(0)` if the item has expired
    /// - `Some(remaining_ms)` if the item has a TTL that hasn't elapsed
    /// - `None` if the item never expires
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        if self.ttl_ms <= 0 {
            return None;
        }
        let elapsed = current_timestamp_ms().saturating_sub(self.last_updated);
        Some((self.ttl_ms as u64).saturating_sub(elapsed))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as zero.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
