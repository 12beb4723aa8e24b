//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! Only the strict interface of [`BoundedMap`](crate::cache::BoundedMap) and construction
//! can fail. The forgiving [`Cache`](crate::cache::Cache) front-end turns blank keys,
//! absent or expired items and type mismatches into plain negative results instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Construction parameters are unusable (e.g. zero capacity)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Key rejected by the strict map interface
    #[error("Invalid key")]
    InvalidKey,

    /// Strict read/write on a key that is not stored
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Strict add on a key that is already stored
    #[error("Key already exists: {0}")]
    KeyAlreadyExists(String),

    /// Nothing stored under the requested key (HTTP surface)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) | CacheError::KeyNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidKey => StatusCode::BAD_REQUEST,
            CacheError::KeyAlreadyExists(_) => StatusCode::CONFLICT,
            CacheError::InvalidConfiguration(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
