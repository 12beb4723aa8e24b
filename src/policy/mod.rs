//! Policy Module
//!
//! Derives cache behaviour from inbound HTTP cache-control headers.
//!
//! A host keeps one [`SessionCache`] per session (see [`SessionRegistry`]) and opens a
//! [`RequestScope`] per inbound request. Every call goes through
//! `session.for_request(&scope)`, which:
//! - parses `Cache-Control` / `Expires` once per request,
//! - clears the durable session cache when `max-age` or `expires` has passed, or when the
//!   request disallows caching,
//! - routes reads and writes to the durable cache, or to the request's transient store
//!   while `no-cache` / `no-store` is in effect.

pub mod directives;
mod registry;
mod scope;
mod session;

pub use directives::{parse_http_date, CacheControl};
pub use registry::SessionRegistry;
pub use scope::{HeaderSource, RequestScope};
pub use session::{PolicyRouter, SessionCache};
