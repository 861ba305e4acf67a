//! Cache Module
//!
//! Provides the bounded, expiring in-memory result cache and request fingerprints.

mod entry;
mod fingerprint;
mod lru;
mod result_cache;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use fingerprint::{content_hash, fingerprint};
pub use lru::LruTracker;
pub use result_cache::{Accounting, ByteCounter, CacheConfig, CachedImage, ResultCache};
pub use stats::CacheStats;
pub use store::{EntryStore, RemovalCause, RemovalListener};
