//! Bounded Map Module
//!
//! Thread-safe key/value map with a fixed capacity and LRU eviction.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::RecencyList;
use crate::error::{CacheError, Result};

// == Map Key ==
/// Keys accepted by [`BoundedMap`].
///
/// `is_valid` lets the strict interface reject keys that stand for "no key at all", such
/// as the empty string.
pub trait MapKey: Eq + Hash + Clone + Debug {
    fn is_valid(&self) -> bool {
        true
    }
}

impl MapKey for String {
    fn is_valid(&self) -> bool {
        !self.is_empty()
    }
}

macro_rules! always_valid_key {
    ($($t:ty),*) => {
        $(impl MapKey for $t {})*
    };
}

always_valid_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, char);

/// Result of a freshness-checked lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// Present and fresh, promoted to most recently used
    Hit(V),
    /// Present but stale, removed as part of the lookup
    Stale,
    /// Not present
    Missing,
}

// == Bounded Map ==
/// Key/value store holding at most `capacity` entries.
///
/// Values and recency order live in one [`RecencyList`] behind a single mutex scoped to
/// this instance. Every operation, including "check count, evict, insert", runs inside
/// one critical section, so the capacity is never exceeded as observed by any caller.
#[derive(Debug)]
pub struct BoundedMap<K, V> {
    inner: Mutex<RecencyList<K, V>>,
    capacity: usize,
}

impl<K, V> BoundedMap<K, V>
where
    K: MapKey,
{
    // == Constructor ==
    /// Creates an empty map.
    ///
    /// Fails with [`CacheError::InvalidConfiguration`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidConfiguration(
                "capacity must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            inner: Mutex::new(RecencyList::new()),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Checks for a key without touching its recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().contains(key)
    }

    // == Get ==
    /// Returns a copy of the value and marks the key as most recently used.
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
        V: Clone,
    {
        let mut inner = self.inner.lock();
        match inner.get(key).cloned() {
            Some(value) => {
                inner.touch(key);
                Ok(value)
            }
            None => Err(CacheError::KeyNotFound(format!("{:?}", key))),
        }
    }

    // == Set ==
    /// Stores a value, evicting the least recently used entry if a new key would exceed
    /// the capacity. An existing key is overwritten and promoted.
    ///
    /// Returns the evicted key, if any.
    pub fn set(&self, key: K, value: V) -> Result<Option<K>> {
        if !key.is_valid() {
            return Err(CacheError::InvalidKey);
        }
        let mut inner = self.inner.lock();
        let evicted = if inner.contains(&key) {
            None
        } else {
            self.make_room(&mut inner)
        };
        inner.push_front(key, value);
        Ok(evicted)
    }

    // == Insert ==
    /// Strict add: fails with [`CacheError::KeyAlreadyExists`] if the key is present.
    pub fn insert(&self, key: K, value: V) -> Result<Option<K>> {
        if !key.is_valid() {
            return Err(CacheError::InvalidKey);
        }
        let mut inner = self.inner.lock();
        if inner.contains(&key) {
            return Err(CacheError::KeyAlreadyExists(format!("{:?}", key)));
        }
        let evicted = self.make_room(&mut inner);
        inner.push_front(key, value);
        Ok(evicted)
    }

    // == Replace ==
    /// Strict indexed write: fails with [`CacheError::KeyNotFound`] if the key is absent.
    ///
    /// Returns the previous value.
    pub fn replace(&self, key: K, value: V) -> Result<V> {
        if !key.is_valid() {
            return Err(CacheError::InvalidKey);
        }
        let mut inner = self.inner.lock();
        if !inner.contains(&key) {
            return Err(CacheError::KeyNotFound(format!("{:?}", key)));
        }
        inner
            .push_front(key.clone(), value)
            .ok_or_else(|| CacheError::KeyNotFound(format!("{:?}", key)))
    }

    /// Inserts `arg` as a new value, or folds it into the existing one, in one step.
    ///
    /// `update` runs for a present key (which is promoted), `create` for an absent one
    /// (evicting if needed). Returns the evicted key, if any.
    pub fn upsert<A, U, C>(&self, key: K, arg: A, update: U, create: C) -> Result<Option<K>>
    where
        U: FnOnce(&mut V, A),
        C: FnOnce(A) -> V,
    {
        if !key.is_valid() {
            return Err(CacheError::InvalidKey);
        }
        let mut inner = self.inner.lock();
        if let Some(value) = inner.get_mut(&key) {
            update(value, arg);
            inner.touch(&key);
            return Ok(None);
        }
        let evicted = self.make_room(&mut inner);
        inner.push_front(key, create(arg));
        Ok(evicted)
    }

    /// Looks a key up, treating entries for which `is_stale` holds as absent.
    ///
    /// A stale entry is removed inside the same critical section as the check, so
    /// concurrent readers of one stale key remove it exactly once.
    pub fn get_fresh<Q, F>(&self, key: &Q, is_stale: F) -> Lookup<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
        F: FnOnce(&V) -> bool,
    {
        let mut inner = self.inner.lock();
        let stale = match inner.get(key) {
            Some(value) => is_stale(value),
            None => return Lookup::Missing,
        };
        if stale {
            inner.remove(key);
            return Lookup::Stale;
        }
        inner.touch(key);
        match inner.get(key) {
            Some(value) => Lookup::Hit(value.clone()),
            None => Lookup::Missing,
        }
    }

    /// Evaluates `f` against a stored value without promoting it.
    pub fn peek_with<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R,
    {
        self.inner.lock().get(key).map(f)
    }

    // == Remove ==
    /// Removes a key, reporting whether anything was removed.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Removes a key and returns its value.
    pub fn take<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().remove(key)
    }

    /// Empties values and recency order in one step.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Snapshot of the current keys, in unspecified order.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Snapshot of the current values, in unspecified order.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.inner.lock().iter().map(|(_, v)| v.clone()).collect()
    }

    /// Snapshot of the current entries, in unspecified order.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        V: Clone,
    {
        self.inner
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Keys from most to least recently used.
    pub fn recency(&self) -> Vec<K> {
        self.inner.lock().keys_by_recency()
    }

    fn make_room(&self, inner: &mut RecencyList<K, V>) -> Option<K> {
        if inner.len() < self.capacity {
            return None;
        }
        let (evicted, _) = inner.evict_oldest()?;
        debug!(key = ?evicted, capacity = self.capacity, "Evicted least recently used entry");
        Some(evicted)
    }
}
