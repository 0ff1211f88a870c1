//! API Module
//!
//! HTTP handlers and routing exposing a JSON cache over REST.
//!
//! # Endpoints
//! - `PUT /set` - Store a JSON value
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `POST /pop/:key` - Retrieve and remove a value
//! - `GET /health` - Store health check

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
