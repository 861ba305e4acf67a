//! Cache Entry Module
//!
//! Defines the record stored for each transform result.

use std::time::{Duration, Instant};

use bytes::Bytes;

// == Cache Entry ==
/// A stored transform result: encoded image, its digest and insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Encoded output image
    pub payload: Bytes,
    /// Hex digest of `payload`, served as the ETag
    pub content_hash: String,
    /// Insertion instant, never updated
    pub created_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current instant.
    pub fn new(payload: Bytes, content_hash: String) -> Self {
        Self::created_at(payload, content_hash, Instant::now())
    }

    /// Creates an entry with an explicit creation instant.
    pub fn created_at(payload: Bytes, content_hash: String, created_at: Instant) -> Self {
        Self {
            payload,
            content_hash,
            created_at,
        }
    }

    // == Size ==
    /// Number of payload bytes accounted against the cache budget.
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    // == Is Expired ==
    /// Checks whether the entry is too old at the observation instant `now`.
    ///
    /// Boundary condition: the entry is expired once `now >= created_at + max_age`.
    pub fn is_expired_at(&self, now: Instant, max_age: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= max_age
    }

    // == Age ==
    /// Returns how long ago the entry was inserted.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
