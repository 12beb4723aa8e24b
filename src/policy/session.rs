//! Session Cache Module
//!
//! The cache-control overlay bound to one logical session.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::cache::{current_timestamp_ms, Cache, CacheValue, ItemStore, TtlCache};
use crate::config::{Config, MaxAgeUnit};
use crate::error::Result;
use crate::policy::{CacheControl, RequestScope};

// == Session Cache ==
/// Durable per-session cache governed by inbound cache-control headers.
///
/// All access goes through [`for_request`](Self::for_request), which ties the session to
/// the scratch scope of the current request.
#[derive(Debug)]
pub struct SessionCache {
    id: String,
    /// Survives across the requests of this session
    durable: TtlCache,
    /// Flags of the most recent request
    flags: RwLock<Option<Arc<CacheControl>>>,
    /// Creation time (Unix milliseconds), the anchor for `max-age`
    created_at: u64,
    max_age_unit: MaxAgeUnit,
}

impl SessionCache {
    // == Constructor ==
    /// Creates the cache of a new session, created at the current time.
    pub fn new(id: impl Into<String>, config: &Config) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            durable: TtlCache::from_config(config)?,
            flags: RwLock::new(None),
            created_at: current_timestamp_ms(),
            max_age_unit: config.max_age_unit,
        })
    }

    /// Backdates the creation time, e.g. for a session restored with a known age.
    pub fn with_created_at(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The durable store, bypassing any request routing.
    pub fn durable(&self) -> &TtlCache {
        &self.durable
    }

    /// Flags computed by the latest request, if any.
    pub fn flags(&self) -> Option<Arc<CacheControl>> {
        self.flags.read().clone()
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    // == For Request ==
    /// Returns the cache as seen by one request.
    ///
    /// The first operation through the returned cache resolves the request's flags and
    /// runs the expiration check; later operations reuse both.
    pub fn for_request<'a>(&'a self, scope: &'a RequestScope) -> Cache<PolicyRouter<'a>> {
        Cache::new(PolicyRouter {
            session: self,
            scope,
        })
    }

    // == Expiration ==
    /// Decides whether the durable content is stale for the given flags.
    ///
    /// Disallowed caching counts as expired. Otherwise a positive `max-age` is measured
    /// from the session's creation; failing that, an `expires` instant is compared with
    /// `now_ms`. The creation time never moves, so once `max-age` has elapsed every later
    /// request clears again.
    pub fn is_expired_at(&self, flags: &CacheControl, now_ms: u64) -> bool {
        if !flags.is_cacheable() {
            return true;
        }
        let now = now_ms as i64;
        if let Some(max_age) = flags.max_age() {
            let deadline =
                (self.created_at as i64).saturating_add(self.max_age_unit.to_millis(max_age));
            return now > deadline;
        }
        match flags.expires_at() {
            Some(expires) => now > expires,
            None => false,
        }
    }

    /// Resolves flags and runs the expiration check, once per request.
    fn prepare(&self, scope: &RequestScope) {
        scope.check_expiration(|| {
            let flags = Arc::clone(scope.flags());
            *self.flags.write() = Some(Arc::clone(&flags));

            let expired = self.is_expired_at(&flags, current_timestamp_ms());
            if expired {
                self.invalidate();
            }
            expired
        });
    }

    fn invalidate(&self) {
        let dropped = self.durable.len();
        self.durable.clear_items();
        info!(session = %self.id, dropped, "Invalidated session cache");
    }
}

// == Policy Router ==
/// [`ItemStore`] that sends each operation to the durable session cache when the
/// request permits caching, and to the request's transient store otherwise.
#[derive(Debug, Clone, Copy)]
pub struct PolicyRouter<'a> {
    session: &'a SessionCache,
    scope: &'a RequestScope,
}

impl<'a> PolicyRouter<'a> {
    pub fn session(&self) -> &'a SessionCache {
        self.session
    }

    pub fn scope(&self) -> &'a RequestScope {
        self.scope
    }

    fn target(&self) -> &'a TtlCache {
        self.session.prepare(self.scope);
        if self.scope.is_cacheable() {
            &self.session.durable
        } else {
            debug!(session = %self.session.id, "Caching disallowed, using request store");
            self.scope.transient()
        }
    }
}

impl ItemStore for PolicyRouter<'_> {
    fn get_item(&self, key: &str) -> Option<CacheValue> {
        self.target().get_item(key)
    }

    fn set_item(&self, key: &str, value: CacheValue) {
        self.target().set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Option<CacheValue> {
        self.target().remove_item(key)
    }

    fn contains_item(&self, key: &str) -> bool {
        self.target().contains_item(key)
    }

    fn clear_items(&self) {
        self.target().clear_items()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Barrier;
    use std::thread;

    fn session() -> SessionCache {
        SessionCache::new("s1", &Config::default()).unwrap()
    }

    fn scope(cache_control: Option<&str>) -> RequestScope {
        let mut headers = HashMap::new();
        if let Some(value) = cache_control {
            headers.insert("Cache-Control".to_string(), value.to_string());
        }
        RequestScope::new(&headers, 10).unwrap()
    }

    #[test]
    fn test_cacheable_request_uses_durable_cache() {
        let session = session();
        let request = scope(None);

        assert!(session.for_request(&request).set("k", 1u32));

        assert!(Cache::new(session.durable()).contains("k"));
        assert!(request.transient().is_empty());
    }

    #[test]
    fn test_no_store_routes_to_transient_store() {
        let session = session();
        let request = scope(Some("no-store"));
        let cache = session.for_request(&request);

        assert!(cache.set("k", "v".to_string()));
        assert_eq!(cache.get_as::<String>("k"), "v");
        assert!(cache.contains("k"));

        assert!(!Cache::new(session.durable()).contains("k"));
        assert_eq!(request.transient().len(), 1);
    }

    #[test]
    fn test_disallowed_caching_clears_durable_cache() {
        let session = session();
        session.for_request(&scope(None)).set("k", 1u8);

        let request = scope(Some("no-cache"));
        assert!(!session.for_request(&request).contains("k"));

        assert!(session.durable().is_empty());
    }

    #[test]
    fn test_max_age_elapsed_clears_durable_cache() {
        let session = session().with_created_at(current_timestamp_ms() - 2_000);
        Cache::new(session.durable()).set("k", 1u8);

        let request = scope(Some("max-age=1"));
        assert!(!session.for_request(&request).contains("k"));

        assert!(session.durable().is_empty());
    }

    #[test]
    fn test_elapsed_max_age_clears_every_later_request() {
        let created_at = current_timestamp_ms() - 2_000;
        let session = session().with_created_at(created_at);

        let first = scope(Some("max-age=1"));
        let cache = session.for_request(&first);
        assert!(!cache.contains("k"));
        cache.set("k", 1u8);
        assert!(cache.contains("k"));

        let second = scope(Some("max-age=1"));
        assert!(!session.for_request(&second).contains("k"));
        assert!(session.durable().is_empty());
        assert_eq!(session.created_at(), created_at);
    }

    #[test]
    fn test_no_cache_does_not_restart_max_age() {
        let created_at = current_timestamp_ms() - 2_000;
        let session = session().with_created_at(created_at);

        session.for_request(&scope(Some("no-cache"))).get("k");
        Cache::new(session.durable()).set("k", 1u8);

        let request = scope(Some("max-age=1"));
        assert!(!session.for_request(&request).contains("k"));
        assert_eq!(session.created_at(), created_at);
    }

    #[test]
    fn test_max_age_not_elapsed_keeps_cache() {
        let session = session();
        Cache::new(session.durable()).set("k", 1u8);

        let request = scope(Some("max-age=60"));
        assert!(session.for_request(&request).contains("k"));
    }

    #[test]
    fn test_max_age_in_milliseconds() {
        let config = Config {
            max_age_unit: MaxAgeUnit::Milliseconds,
            ..Config::default()
        };
        let created_at = current_timestamp_ms() - 500;
        let session = SessionCache::new("ms", &config)
            .unwrap()
            .with_created_at(created_at);
        let flags = CacheControl::parse(Some("max-age=100"), None);

        assert!(session.is_expired_at(&flags, created_at + 101));
        assert!(!session.is_expired_at(&flags, created_at + 100));
    }

    #[test]
    fn test_expires_in_the_past_clears_cache() {
        let session = session();
        Cache::new(session.durable()).set("k", 1u8);

        let mut headers = HashMap::new();
        headers.insert("Expires".to_string(), "Thu, 01 Dec 1994 16:00:00 GMT".to_string());
        let request = RequestScope::new(&headers, 10).unwrap();

        assert!(!session.for_request(&request).contains("k"));
        assert!(session.durable().is_empty());
    }

    #[test]
    fn test_expires_in_the_future_keeps_cache() {
        let session = session();
        Cache::new(session.durable()).set("k", 1u8);

        let mut headers = HashMap::new();
        headers.insert("Expires".to_string(), "Fri, 01 Jan 2100 00:00:00 GMT".to_string());
        let request = RequestScope::new(&headers, 10).unwrap();

        assert!(session.for_request(&request).contains("k"));
    }

    #[test]
    fn test_max_age_takes_precedence_over_expires() {
        let session = session();
        let flags =
            CacheControl::parse(Some("max-age=60"), Some("Thu, 01 Dec 1994 16:00:00 GMT"));

        assert!(!session.is_expired_at(&flags, current_timestamp_ms()));
    }

    #[test]
    fn test_expiration_check_runs_once_per_request() {
        let session = session().with_created_at(current_timestamp_ms() - 2_000);
        let request = scope(Some("max-age=1"));
        let cache = session.for_request(&request);

        // The first access clears; the write afterwards must survive the rest of the request
        assert!(!cache.contains("k"));
        cache.set("k", 1u8);
        cache.set("j", 2u8);

        assert!(cache.contains("k"));
        assert!(cache.contains("j"));
        assert_eq!(session.durable().len(), 2);
    }

    #[test]
    fn test_flags_are_published_on_session() {
        let session = session();
        assert!(session.flags().is_none());

        let request = scope(Some("max-age=30"));
        session.for_request(&request).get("anything");

        let flags = session.flags().unwrap();
        assert!(Arc::ptr_eq(&flags, request.flags()));
        assert_eq!(flags.max_age(), Some(30));
    }

    #[test]
    fn test_transient_store_does_not_outlive_request() {
        let session = session();
        {
            let request = scope(Some("no-store"));
            session.for_request(&request).set("k", 1u8);
        }

        let next = scope(Some("no-store"));
        assert!(!session.for_request(&next).contains("k"));
    }

    #[test]
    fn test_concurrent_requests_keep_their_own_scope() {
        let session = session();
        let barrier = Barrier::new(2);

        thread::scope(|s| {
            s.spawn(|| {
                let request = scope(Some("no-store"));
                let cache = session.for_request(&request);
                // First access runs this request's check, clearing the durable cache
                assert!(!cache.contains("warmup"));
                barrier.wait();

                for i in 0..10 {
                    cache.set(&format!("private{}", i), i);
                }
                assert!(!request.is_cacheable());
                assert_eq!(cache.get_as::<i32>("private7"), 7);
                assert_eq!(request.transient().len(), 10);
            });
            s.spawn(|| {
                let request = scope(Some("max-age=60"));
                let cache = session.for_request(&request);
                assert!(!cache.contains("warmup"));
                barrier.wait();

                for i in 0..50 {
                    cache.set(&format!("shared{}", i), i);
                }
                assert!(request.is_cacheable());
                assert_eq!(cache.get_as::<i32>("shared7"), 7);
                assert!(request.transient().is_empty());
            });
        });

        let durable = Cache::new(session.durable());
        assert_eq!(session.durable().len(), 50);
        assert!(durable.contains("shared49"));
        assert!(!durable.contains("private0"));
    }
}
