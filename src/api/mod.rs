//! API Module
//!
//! HTTP handlers and routing for the resize service.
//!
//! # Endpoints
//! - `GET /?url=&width=&height=` - Resized JPEG, served from cache when possible
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
