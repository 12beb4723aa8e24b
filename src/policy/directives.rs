//! Cache-Control Directives Module
//!
//! Interprets the inbound `Cache-Control` and `Expires` request headers.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::cache::current_timestamp_ms;

/// Name of the `Cache-Control` request header
pub const CACHE_CONTROL: &str = "cache-control";

/// Name of the `Expires` request header
pub const EXPIRES: &str = "expires";

/// RFC 1123 date format, e.g. `Thu, 01 Dec 1994 16:00:00 GMT`
pub const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

const NO_CACHE: &str = "no-cache";
const NO_STORE: &str = "no-store";
const MAX_AGE: &str = "max-age";
const EXPIRES_FLAG: &str = "expires";

// == Cache Control ==
/// Parsed cache-control flags of one request.
///
/// Directive names and values are lowercased. A directive without `=` maps to an empty
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    directives: HashMap<String, String>,
    /// When the flags were computed (Unix milliseconds)
    computed_at: u64,
}

impl CacheControl {
    // == Parse ==
    /// Builds the flags from raw header values.
    ///
    /// `Cache-Control` is split on commas, then on the first `=`; a repeated directive
    /// overwrites the earlier one. Unless `Cache-Control` already carried `expires`, a
    /// valid RFC 1123 `Expires` header becomes an `expires` flag holding its instant in
    /// Unix milliseconds. An unparsable `Expires` header is ignored.
    pub fn parse(cache_control: Option<&str>, expires: Option<&str>) -> Self {
        let mut directives = HashMap::new();

        for directive in cache_control.unwrap_or_default().split(',') {
            let mut parts = directive.splitn(2, '=');
            let name = parts.next().unwrap_or_default().trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let value = parts
                .next()
                .map(|v| v.trim().trim_matches('"').to_lowercase())
                .unwrap_or_default();
            directives.insert(name, value);
        }

        if !directives.contains_key(EXPIRES_FLAG) {
            if let Some(at) = expires.and_then(parse_http_date) {
                directives.insert(EXPIRES_FLAG.to_string(), at.to_string());
            }
        }

        Self {
            directives,
            computed_at: current_timestamp_ms(),
        }
    }

    /// Returns the value of a directive (lowercase), if present.
    pub fn directive(&self, name: &str) -> Option<&str> {
        self.directives
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.directive(name).is_some()
    }

    pub fn directives(&self) -> &HashMap<String, String> {
        &self.directives
    }

    pub fn computed_at(&self) -> u64 {
        self.computed_at
    }

    // == Cacheability ==
    /// Caching is allowed unless `no-cache` or `no-store` is present.
    pub fn is_cacheable(&self) -> bool {
        !self.has(NO_CACHE) && !self.has(NO_STORE)
    }

    /// Returns a positive numeric `max-age`, ignoring zero, negative or non-numeric values.
    pub fn max_age(&self) -> Option<i64> {
        self.directive(MAX_AGE)?
            .parse::<i64>()
            .ok()
            .filter(|age| *age > 0)
    }

    /// Returns the `expires` instant in Unix milliseconds, if it is numeric.
    pub fn expires_at(&self) -> Option<i64> {
        self.directive(EXPIRES_FLAG)?.parse::<i64>().ok()
    }
}

// == HTTP Date ==
/// Parses an RFC 1123 date (`ddd, dd MMM yyyy HH:mm:ss GMT`) into Unix milliseconds.
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, RFC1123_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&value.to_ascii_uppercase(), RFC1123_FORMAT))
        .ok()
        .map(|at| at.and_utc().timestamp_millis())
}
