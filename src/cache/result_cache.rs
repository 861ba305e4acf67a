//! Result Cache Module
//!
//! Byte-budgeted, expiring cache of transform results. Entries are evicted in
//! least-recently-used order once the budget is exceeded, and expired entries
//! are dropped lazily when a lookup observes them. There is no background
//! sweeper.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::{CacheEntry, CacheStats, EntryStore, RemovalCause, RemovalListener};
use crate::error::CacheError;

// == Cache Config ==
/// Construction parameters, fixed for the lifetime of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Aggregate payload budget in bytes
    pub max_size: u64,
    /// Age at which an entry stops being served
    pub max_age: Duration,
}

/// Item capacity of the underlying store.
///
/// A stored payload costs at least one byte, so a store holding `max_size`
/// items is already at the byte budget: the item bound never evicts an entry
/// the byte budget would have kept.
fn item_capacity(max_size: u64) -> usize {
    usize::try_from(max_size).unwrap_or(usize::MAX)
}

// == Cached Image ==
/// A cache hit: shared view of the payload and its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImage {
    pub payload: Bytes,
    pub content_hash: String,
}

// == Byte Counter ==
/// Running total of payload bytes held by the store.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter(Arc<AtomicU64>);

impl ByteCounter {
    pub fn add(&self, bytes: u64) {
        self.0.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn sub(&self, bytes: u64) {
        self.0.fetch_sub(bytes, Ordering::SeqCst);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// == Accounting ==
/// Removal listener keeping the byte counter and removal stats in step with the store.
#[derive(Debug)]
pub struct Accounting {
    size: ByteCounter,
    stats: CacheStats,
}

impl RemovalListener for Accounting {
    fn on_removal(&mut self, key: &str, entry: &CacheEntry, cause: RemovalCause) {
        self.size.sub(entry.size());

        match cause {
            RemovalCause::Evicted => {
                self.stats.record_eviction();
                info!(key = %key, bytes = entry.size(), "cache purged");
            }
            RemovalCause::Expired => {
                self.stats.record_expiration();
                debug!(
                    key = %key,
                    age_ms = entry.age().as_millis() as u64,
                    "cache entry expired"
                );
            }
            RemovalCause::Replaced | RemovalCause::Explicit => {
                debug!(key = %key, ?cause, "cache entry removed");
            }
        }
    }
}

// == Result Cache ==
/// Thread-safe, byte-bounded, expiring cache of encoded images.
///
/// All structural changes go through one lock, so the byte counter always
/// matches the entries in the store once an operation returns.
#[derive(Debug)]
pub struct ResultCache {
    store: Mutex<EntryStore<Accounting>>,
    size: ByteCounter,
    max_size: u64,
    max_age: Duration,
}

impl ResultCache {
    // == Constructor ==
    /// Creates an empty cache. Fails for a zero byte budget.
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let size = ByteCounter::default();
        let accounting = Accounting {
            size: size.clone(),
            stats: CacheStats::new(),
        };
        let store = EntryStore::new(item_capacity(config.max_size), accounting)?;

        Ok(Self {
            store: Mutex::new(store),
            size,
            max_size: config.max_size,
            max_age: config.max_age,
        })
    }

    // == Add ==
    /// Inserts or replaces the result for `fingerprint`, then evicts least
    /// recently used entries until the byte budget holds again.
    ///
    /// A payload larger than the whole budget is kept alone: every other entry
    /// is evicted but the new one stays.
    pub async fn add(&self, fingerprint: String, payload: Bytes, content_hash: String) {
        let entry = CacheEntry::new(payload, content_hash);
        let bytes = entry.size();

        let mut store = self.store.lock().await;
        store.insert(fingerprint, entry);
        self.size.add(bytes);

        while self.size.get() > self.max_size && store.len() > 1 {
            if store.pop_lru(RemovalCause::Evicted).is_none() {
                break;
            }
        }

        debug!(
            bytes,
            current_size = self.size.get(),
            entries = store.len(),
            "added to cache"
        );
    }

    // == Get ==
    /// Returns the cached result for `fingerprint` if present and fresh.
    ///
    /// An expired entry is removed and reported as a miss.
    pub async fn get(&self, fingerprint: &str) -> Option<CachedImage> {
        self.get_at(fingerprint, Instant::now()).await
    }

    async fn get_at(&self, fingerprint: &str, now: Instant) -> Option<CachedImage> {
        let mut store = self.store.lock().await;

        let expired = match store.peek(fingerprint) {
            Some(entry) => entry.is_expired_at(now, self.max_age),
            None => {
                store.listener_mut().stats.record_miss();
                return None;
            }
        };

        if expired {
            store.remove(fingerprint, RemovalCause::Expired);
            store.listener_mut().stats.record_miss();
            return None;
        }

        let hit = store.get(fingerprint).map(|entry| CachedImage {
            payload: entry.payload.clone(),
            content_hash: entry.content_hash.clone(),
        });
        store.listener_mut().stats.record_hit();
        debug!(key = %fingerprint, "cache hit");
        hit
    }

    // == Remove ==
    /// Drops the entry for `fingerprint`. Returns whether one was present.
    pub async fn remove(&self, fingerprint: &str) -> bool {
        let mut store = self.store.lock().await;
        store.remove(fingerprint, RemovalCause::Explicit).is_some()
    }

    /// Bytes currently held, read without taking the lock.
    pub fn current_size(&self) -> u64 {
        self.size.get()
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of counters and current occupancy.
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.lock().await;
        let mut stats = store.listener().stats.clone();
        stats.total_entries = store.len();
        stats.current_size = self.size.get();
        stats.max_size = self.max_size;
        stats
    }

    /// Sum of payload sizes recomputed from the entries themselves.
    #[cfg(test)]
    pub(crate) async fn payload_bytes(&self) -> u64 {
        self.store.lock().await.payload_bytes()
    }
}
