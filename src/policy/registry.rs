//! Session Registry Module
//!
//! Session-scoped storage slot: one [`SessionCache`] per session id, created on first use.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::policy::{HeaderSource, RequestScope, SessionCache};

// == Session Registry ==
/// Owns the session caches of a host.
///
/// The number of live sessions is not bounded here; ending a session (and thereby
/// dropping its cache) is up to the host via [`remove`](Self::remove).
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<SessionCache>>,
    config: Config,
}

impl SessionRegistry {
    /// Creates an empty registry after validating the configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sessions: DashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // == Session ==
    /// Returns the cache of a session, creating it on first access.
    pub fn session(&self, id: &str) -> Result<Arc<SessionCache>> {
        if let Some(existing) = self.sessions.get(id) {
            return Ok(Arc::clone(existing.value()));
        }
        let entry = self
            .sessions
            .entry(id.to_string())
            .or_try_insert_with(|| {
                info!(session = id, "Creating session cache");
                SessionCache::new(id, &self.config).map(Arc::new)
            })?;
        Ok(Arc::clone(entry.value()))
    }

    /// Opens the scratch scope of a new request using the configured transient capacity.
    pub fn begin_request<H>(&self, headers: &H) -> Result<RequestScope>
    where
        H: HeaderSource + ?Sized,
    {
        RequestScope::new(headers, self.config.transient_capacity)
    }

    /// Returns an existing session without creating one.
    pub fn get(&self, id: &str) -> Option<Arc<SessionCache>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Ends a session, dropping its cache once no request holds it anymore.
    pub fn remove(&self, id: &str) -> Option<Arc<SessionCache>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use std::collections::HashMap;
    use std::thread;

    #[test]
    fn test_registry_rejects_invalid_config() {
        let config = Config {
            capacity: 0,
            ..Config::default()
        };
        assert!(matches!(
            SessionRegistry::new(config),
            Err(CacheError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_session_created_on_first_use() {
        let registry = SessionRegistry::new(Config::default()).unwrap();
        assert!(registry.get("a").is_none());

        let first = registry.session("a").unwrap();
        let second = registry.session("a").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id(), "a");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let registry = SessionRegistry::new(Config::default()).unwrap();
        let request = registry.begin_request(&HashMap::<String, String>::new()).unwrap();

        registry.session("a").unwrap().for_request(&request).set("k", 1u8);

        let other = registry.begin_request(&HashMap::<String, String>::new()).unwrap();
        assert!(!registry.session("b").unwrap().for_request(&other).contains("k"));
    }

    #[test]
    fn test_remove_session() {
        let registry = SessionRegistry::new(Config::default()).unwrap();
        registry.session("a").unwrap();

        assert!(registry.remove("a").is_some());
        assert!(registry.is_empty());
        assert!(registry.remove("a").is_none());
    }

    #[test]
    fn test_concurrent_first_access_creates_one_session() {
        let registry = Arc::new(SessionRegistry::new(Config::default()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.session("shared").unwrap())
            })
            .collect();
        let sessions: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 1);
        assert!(sessions.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_begin_request_uses_transient_capacity() {
        let config = Config {
            transient_capacity: 7,
            ..Config::default()
        };
        let registry = SessionRegistry::new(config).unwrap();
        let request = registry.begin_request(&HashMap::<String, String>::new()).unwrap();

        assert_eq!(request.transient().capacity(), 7);
    }
}
