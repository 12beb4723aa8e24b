//! API Module
//!
//! HTTP handlers and routing for the session cache server.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `POST /clear` - Clear the session's cache
//! - `GET /stats` - Get session cache statistics
//! - `GET /health` - Health check endpoint
//!
//! Requests name their session with the `x-session-id` header.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
