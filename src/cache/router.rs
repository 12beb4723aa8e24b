//! Cache Front-End Module
//!
//! Splits the cache into a forgiving public interface ([`Cache`]) and the storage
//! capability it routes through ([`ItemStore`]). Swapping the store changes where items
//! live without touching key validation or typed access.

use std::any::Any;
use std::sync::Arc;

use tracing::trace;

use crate::cache::TtlCache;
use crate::error::Result;

/// Type-erased value as held by the cache.
pub type CacheValue = Arc<dyn Any + Send + Sync>;

// == Item Store ==
/// Storage capability behind a [`Cache`].
///
/// Implementations receive keys that are already known to be non-blank.
pub trait ItemStore {
    /// Returns the value for a key, or None if absent or stale.
    fn get_item(&self, key: &str) -> Option<CacheValue>;

    /// Stores a value under a key.
    fn set_item(&self, key: &str, value: CacheValue);

    /// Removes a key and returns whatever was stored.
    fn remove_item(&self, key: &str) -> Option<CacheValue>;

    fn contains_item(&self, key: &str) -> bool;

    fn clear_items(&self);
}

impl<S: ItemStore + ?Sized> ItemStore for &S {
    fn get_item(&self, key: &str) -> Option<CacheValue> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: CacheValue) {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Option<CacheValue> {
        (**self).remove_item(key)
    }

    fn contains_item(&self, key: &str) -> bool {
        (**self).contains_item(key)
    }

    fn clear_items(&self) {
        (**self).clear_items()
    }
}

impl<S: ItemStore + ?Sized> ItemStore for Arc<S> {
    fn get_item(&self, key: &str) -> Option<CacheValue> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: CacheValue) {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Option<CacheValue> {
        (**self).remove_item(key)
    }

    fn contains_item(&self, key: &str) -> bool {
        (**self).contains_item(key)
    }

    fn clear_items(&self) {
        (**self).clear_items()
    }
}

fn is_blank(key: &str) -> bool {
    key.trim().is_empty()
}

// == Cache ==
/// Forgiving cache interface over an injected [`ItemStore`].
///
/// Nothing here fails: blank keys, absent or expired items and type mismatches all come
/// back as negative results (`false`, `None` or `T::default()`).
///
/// # Example
/// ```
/// use session_cache::cache::Cache;
///
/// let cache = Cache::bounded(100, 300_000).unwrap();
/// assert!(cache.set("answer", 42u32));
/// assert_eq!(cache.get_as::<u32>("answer"), 42);
/// assert_eq!(cache.get_as::<String>("answer"), String::new());
/// assert!(!cache.set("  ", 1u32));
/// ```
#[derive(Debug, Clone)]
pub struct Cache<S> {
    store: S,
}

impl Cache<TtlCache> {
    /// Creates a cache backed by a fresh [`TtlCache`].
    pub fn bounded(capacity: usize, default_ttl_ms: i64) -> Result<Self> {
        Ok(Self::new(TtlCache::new(capacity, default_ttl_ms)?))
    }
}

impl<S: ItemStore> Cache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the store this cache routes through.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn contains(&self, key: &str) -> bool {
        !is_blank(key) && self.store.contains_item(key)
    }

    pub fn get(&self, key: &str) -> Option<CacheValue> {
        if is_blank(key) {
            return None;
        }
        self.store.get_item(key)
    }

    /// Returns the value as `T`, or `T::default()` if absent or of another type.
    pub fn get_as<T>(&self, key: &str) -> T
    where
        T: Any + Clone + Default,
    {
        downcast_or_default(self.get(key))
    }

    // == Set ==
    /// Stores a value. Returns false (and stores nothing) for a blank key.
    pub fn set<V>(&self, key: &str, value: V) -> bool
    where
        V: Any + Send + Sync,
    {
        self.set_value(key, Arc::new(value))
    }

    /// Stores an already type-erased value.
    pub fn set_value(&self, key: &str, value: CacheValue) -> bool {
        if is_blank(key) {
            trace!("Ignoring write for blank key");
            return false;
        }
        self.store.set_item(key, value);
        true
    }

    /// Removes a key and returns what was stored, stale or not.
    pub fn remove(&self, key: &str) -> Option<CacheValue> {
        if is_blank(key) {
            return None;
        }
        self.store.remove_item(key)
    }

    /// Removes a key and returns the value as `T`, or `T::default()` on absence or
    /// type mismatch. The entry is removed either way.
    pub fn remove_as<T>(&self, key: &str) -> T
    where
        T: Any + Clone + Default,
    {
        downcast_or_default(self.remove(key))
    }

    pub fn clear(&self) {
        self.store.clear_items();
    }
}

fn downcast_or_default<T>(value: Option<CacheValue>) -> T
where
    T: Any + Clone + Default,
{
    value
        .and_then(|value| value.downcast_ref::<T>().cloned())
        .unwrap_or_default()
}
