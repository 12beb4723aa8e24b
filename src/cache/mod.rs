//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.
//!
//! Layers, leaf first: [`TtlItem`] values, the [`RecencyList`] ordering them, the
//! thread-safe [`BoundedMap`], the [`TtlCache`] store and the forgiving [`Cache`]
//! front-end that routes through any [`ItemStore`].

mod item;
mod lru;
mod map;
mod router;
mod stats;
mod store;


// Re-export public types
pub use item::{current_timestamp_ms, TtlItem};
pub use lru::RecencyList;
pub use map::{BoundedMap, Lookup, MapKey};
pub use router::{Cache, CacheValue, ItemStore};
pub use stats::{CacheStats, StatsRecorder};
pub use store::TtlCache;
