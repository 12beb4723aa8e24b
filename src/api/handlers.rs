//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.
//!
//! Every cache operation opens a [`RequestScope`](crate::policy::RequestScope) from the
//! inbound headers and goes through the caller's session, so `Cache-Control` and
//! `Expires` on the request decide where values are read from and written to.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use crate::cache::CacheStats;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse,
    StatsResponse,
};
use crate::policy::SessionRegistry;

/// Header naming the session a request belongs to
pub const SESSION_HEADER: &str = "x-session-id";

/// Session used by requests that carry no session header
pub const ANONYMOUS_SESSION: &str = "anonymous";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session caches of this host
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Creates a new AppState with the given registry.
    pub fn new(sessions: SessionRegistry) -> Self {
        Self {
            sessions: Arc::new(sessions),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Fails if the configuration is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(SessionRegistry::new(config.clone())?))
    }
}

/// Reads the session id from the request, falling back to the anonymous session.
pub fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(ANONYMOUS_SESSION)
        .to_string()
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the caller's session, or only for this request when the
/// request disallows caching.
pub async fn set_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let session = state.sessions.session(&session_id(&headers))?;
    let scope = state.sessions.begin_request(&headers)?;
    let cache = session.for_request(&scope);

    if !cache.set(&req.key, req.value) {
        return Err(CacheError::InvalidKey);
    }

    Ok(Json(SetResponse::new(req.key, scope.is_cacheable())))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the caller's session by key.
pub async fn get_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let session = state.sessions.session(&session_id(&headers))?;
    let scope = state.sessions.begin_request(&headers)?;

    let value = session
        .for_request(&scope)
        .get(&key)
        .and_then(|value| value.downcast_ref::<String>().cloned())
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the caller's session. Fails with 404 if nothing was stored.
pub async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let session = state.sessions.session(&session_id(&headers))?;
    let scope = state.sessions.begin_request(&headers)?;

    session
        .for_request(&scope)
        .remove(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /clear
///
/// Empties the store the request is routed to.
pub async fn clear_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ClearResponse>> {
    let id = session_id(&headers);
    let session = state.sessions.session(&id)?;
    let scope = state.sessions.begin_request(&headers)?;

    session.for_request(&scope).clear();

    Ok(Json(ClearResponse::new(id)))
}

/// Handler for GET /stats
///
/// Returns the statistics of the caller's durable session cache, with the directives of
/// its latest request. Does not create a session and does not apply the request's
/// cache-control headers.
pub async fn stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<StatsResponse> {
    let id = session_id(&headers);
    let sessions = state.sessions.len();

    let response = match state.sessions.get(&id) {
        Some(session) => {
            let response = StatsResponse::new(id, session.durable().stats(), sessions);
            match session.flags() {
                Some(flags) => response.with_flags(flags.directives().clone()),
                None => response,
            }
        }
        None => StatsResponse::new(id, CacheStats::default(), sessions),
    };

    Json(response)
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
