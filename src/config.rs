//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::error::{CacheError, Result};

/// Default capacity of a durable cache
pub const DEFAULT_CAPACITY: usize = 100;

/// Default TTL in milliseconds (5 minutes)
pub const DEFAULT_TTL_MS: i64 = 300_000;

// == Max-Age Unit ==
/// Unit in which the `max-age` cache-control directive is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxAgeUnit {
    /// Whole seconds, as defined by HTTP caching
    #[default]
    Seconds,
    /// Raw milliseconds added to the session creation time
    Milliseconds,
}

impl MaxAgeUnit {
    /// Converts a `max-age` value into milliseconds.
    pub fn to_millis(self, max_age: i64) -> i64 {
        match self {
            MaxAgeUnit::Seconds => max_age.saturating_mul(1000),
            MaxAgeUnit::Milliseconds => max_age,
        }
    }
}

impl FromStr for MaxAgeUnit {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "seconds" => Ok(MaxAgeUnit::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(MaxAgeUnit::Milliseconds),
            other => Err(CacheError::InvalidConfiguration(format!(
                "unknown max-age unit '{}'",
                other
            ))),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries a durable (per-session) cache can hold
    pub capacity: usize,
    /// Default TTL in milliseconds, `<= 0` disables expiry
    pub default_ttl_ms: i64,
    /// Maximum number of entries of a request-scoped transient store
    pub transient_capacity: usize,
    /// Unit of the `max-age` directive
    pub max_age_unit: MaxAgeUnit,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 100)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `TRANSIENT_CAPACITY` - Maximum entries of a per-request store (default: 100)
    /// - `MAX_AGE_UNIT` - `seconds` or `milliseconds` (default: seconds)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env_or("CACHE_CAPACITY", defaults.capacity),
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            transient_capacity: env_or("TRANSIENT_CAPACITY", defaults.transient_capacity),
            max_age_unit: env_or("MAX_AGE_UNIT", defaults.max_age_unit),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    /// Rejects configurations no cache can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfiguration(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if self.transient_capacity == 0 {
            return Err(CacheError::InvalidConfiguration(
                "transient capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            default_ttl_ms: DEFAULT_TTL_MS,
            transient_capacity: DEFAULT_CAPACITY,
            max_age_unit: MaxAgeUnit::Seconds,
            server_port: 3000,
        }
    }
}
