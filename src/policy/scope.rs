//! Request Scope Module
//!
//! Per-request scratch storage: header access, memoized policy decisions and the
//! transient store used while caching is disallowed.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use axum::http::HeaderMap;

use crate::cache::TtlCache;
use crate::error::Result;
use crate::policy::directives::{CACHE_CONTROL, EXPIRES};
use crate::policy::CacheControl;

// == Header Source ==
/// Read access to inbound request headers by name.
///
/// Names are matched case-insensitively.
pub trait HeaderSource {
    /// Returns the header value, joining repeated headers with `", "`.
    fn header(&self, name: &str) -> Option<String>;

    /// Returns only the first value of a header that may be repeated.
    fn first_header(&self, name: &str) -> Option<String>;
}

impl HeaderSource for HeaderMap {
    fn header(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    fn first_header(&self, name: &str) -> Option<String> {
        self.get_all(name)
            .iter()
            .find_map(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

impl HeaderSource for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<String> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn first_header(&self, name: &str) -> Option<String> {
        self.header(name)
    }
}

// == Request Scope ==
/// Scratch state bound to one inbound request of one session.
///
/// Each decision is computed on first use and reused for the rest of the request.
/// Concurrent requests never share a scope, so their memoized values stay independent.
#[derive(Debug)]
pub struct RequestScope {
    cache_control: Option<String>,
    expires: Option<String>,
    flags: OnceLock<Arc<CacheControl>>,
    cacheable: OnceLock<bool>,
    expired: OnceLock<bool>,
    /// Holds writes while caching is disallowed; dropped with the request
    transient: TtlCache,
}

impl RequestScope {
    // == Constructor ==
    /// Captures the cache headers of a request.
    ///
    /// Repeated `Cache-Control` headers are combined; of repeated `Expires` headers only
    /// the first counts.
    ///
    /// # Arguments
    /// * `headers` - Inbound request headers
    /// * `transient_capacity` - Capacity of the request-scoped store, must be > 0
    pub fn new<H>(headers: &H, transient_capacity: usize) -> Result<Self>
    where
        H: HeaderSource + ?Sized,
    {
        Ok(Self {
            cache_control: headers.header(CACHE_CONTROL),
            expires: headers.first_header(EXPIRES),
            flags: OnceLock::new(),
            cacheable: OnceLock::new(),
            expired: OnceLock::new(),
            transient: TtlCache::transient(transient_capacity)?,
        })
    }

    /// Parsed cache-control flags, computed on first call.
    pub fn flags(&self) -> &Arc<CacheControl> {
        self.flags.get_or_init(|| {
            Arc::new(CacheControl::parse(
                self.cache_control.as_deref(),
                self.expires.as_deref(),
            ))
        })
    }

    /// Whether this request permits the durable cache, computed on first call.
    pub fn is_cacheable(&self) -> bool {
        *self.cacheable.get_or_init(|| self.flags().is_cacheable())
    }

    /// Runs the session expiration check at most once per request and returns its
    /// (memoized) outcome.
    pub(crate) fn check_expiration<F>(&self, check: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        *self.expired.get_or_init(check)
    }

    /// Whether the expiration check has already run for this request.
    pub fn expiration_checked(&self) -> bool {
        self.expired.get().is_some()
    }

    /// The request-scoped store.
    pub fn transient(&self) -> &TtlCache {
        &self.transient
    }
}
