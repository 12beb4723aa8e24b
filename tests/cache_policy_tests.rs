//! Library-level tests of the cache and the cache-control policy layer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread::{self, sleep};
use std::time::Duration;

use session_cache::cache::{current_timestamp_ms, BoundedMap, Cache, TtlCache};
use session_cache::{Config, RequestScope, SessionCache};

fn request(cache_control: Option<&str>) -> RequestScope {
    let mut headers = HashMap::new();
    if let Some(value) = cache_control {
        headers.insert("Cache-Control".to_string(), value.to_string());
    }
    RequestScope::new(&headers, 16).unwrap()
}

// == Capacity & LRU ==

#[test]
fn test_overflow_drops_earliest_untouched_keys() {
    let capacity = 5;
    let extra = 3;
    let cache = Cache::bounded(capacity, 0).unwrap();

    for i in 0..capacity + extra {
        assert!(cache.set(&format!("key{}", i), i));
    }

    assert_eq!(cache.store().len(), capacity);
    for i in 0..extra {
        assert!(!cache.contains(&format!("key{}", i)));
    }
    for i in extra..capacity + extra {
        assert!(cache.contains(&format!("key{}", i)));
    }
    assert_eq!(cache.store().stats().evictions, extra as u64);
}

#[test]
fn test_read_promotes_key() {
    let cache = Cache::bounded(2, 0).unwrap();
    cache.set("A", 1u8);
    cache.set("B", 2u8);

    cache.get("A");
    cache.set("C", 3u8);

    assert!(cache.contains("A"));
    assert!(!cache.contains("B"));
    assert!(cache.contains("C"));
}

#[test]
fn test_concurrent_inserts_keep_capacity() {
    let capacity = 16;
    let map = Arc::new(BoundedMap::new(capacity).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..capacity * 2 {
                    map.set(format!("t{}-{}", t, i), i).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let recency = map.recency();
    let unique: HashSet<_> = recency.iter().cloned().collect();
    let mut keys = map.keys();
    keys.sort();
    let mut sorted_recency = recency.clone();
    sorted_recency.sort();

    assert_eq!(map.len(), capacity);
    assert_eq!(unique.len(), capacity);
    assert_eq!(keys, sorted_recency);
}

// == TTL ==

#[test]
fn test_item_ttl_bounds() {
    let cache = Cache::new(TtlCache::new(10, 50).unwrap());
    cache.set("k", "v".to_string());

    assert_eq!(cache.get_as::<String>("k"), "v");

    sleep(Duration::from_millis(80));

    // Still stored until an access finds it stale
    assert_eq!(cache.store().len(), 1);
    assert!(cache.get("k").is_none());
    assert!(cache.store().is_empty());
}

#[test]
fn test_non_expiring_items() {
    let cache = Cache::new(TtlCache::new(10, 0).unwrap());
    cache.set("k", 7i64);

    sleep(Duration::from_millis(20));

    assert_eq!(cache.get_as::<i64>("k"), 7);
}

#[test]
fn test_clear_is_idempotent() {
    let cache = Cache::bounded(10, 0).unwrap();
    cache.clear();

    cache.set("a", 1u8);
    cache.set("b", 2u8);
    cache.clear();
    cache.clear();

    assert!(!cache.contains("a"));
    assert!(!cache.contains("b"));
    assert!(cache.store().is_empty());
}

#[test]
fn test_blank_key_is_a_no_op() {
    let cache = Cache::bounded(10, 0).unwrap();
    cache.set("k", 1u8);

    assert!(!cache.set("", 2u8));
    assert!(cache.get("").is_none());
    assert_eq!(cache.store().keys(), vec!["k".to_string()]);
}

// == Cache-Control ==

#[test]
fn test_no_store_value_visible_only_within_request() {
    let session = SessionCache::new("s", &Config::default()).unwrap();
    let scope = request(Some("no-store"));
    let cache = session.for_request(&scope);

    assert!(cache.set("k", "v".to_string()));
    assert_eq!(cache.get_as::<String>("k"), "v");

    assert!(!Cache::new(session.durable()).contains("k"));
}

#[test]
fn test_max_age_elapsed_clears_before_serving() {
    let session = SessionCache::new("s", &Config::default())
        .unwrap()
        .with_created_at(current_timestamp_ms() - 2_000);
    Cache::new(session.durable()).set("k", 1u8);
    Cache::new(session.durable()).set("j", 2u8);

    let scope = request(Some("max-age=1"));
    let cache = session.for_request(&scope);

    assert!(!cache.contains("k"));
    assert!(session.durable().is_empty());
}

#[test]
fn test_flags_are_case_insensitive() {
    let session = SessionCache::new("s", &Config::default()).unwrap();
    let scope = request(Some("No-Store, MAX-AGE=60"));

    session.for_request(&scope).set("k", 1u8);

    assert!(!scope.is_cacheable());
    assert_eq!(scope.flags().max_age(), Some(60));
    assert!(session.durable().is_empty());
}
