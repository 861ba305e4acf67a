//! Thumbcache - An image resize proxy with a bounded, expiring result cache
//!
//! Fetches remote JPEGs, resizes them and caches the encoded results under a
//! byte budget with LRU eviction and age-based expiry.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;

pub use api::{create_router, AppState, Limits};
pub use cache::{CacheConfig, ResultCache};
pub use config::Config;
pub use pipeline::{JpegTransformer, Transformer};
