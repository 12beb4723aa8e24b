//! Session Cache - in-process caching with HTTP cache-control awareness
//!
//! Provides a bounded LRU cache with per-item TTL, and a policy layer that lets inbound
//! `Cache-Control` / `Expires` headers decide whether a session's cache is used,
//! bypassed for the current request or invalidated.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;

pub use api::{create_router, AppState};
pub use cache::{Cache, CacheValue, ItemStore, TtlCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use policy::{RequestScope, SessionCache, SessionRegistry};
