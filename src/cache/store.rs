//! Entry Store Module
//!
//! Item-bounded storage combining a HashMap with LRU tracking. Every removal,
//! whatever triggered it, is reported exactly once to a [`RemovalListener`].

use std::collections::HashMap;
use std::num::NonZeroUsize;

use crate::cache::{CacheEntry, LruTracker};
use crate::error::CacheError;

// == Removal Cause ==
/// Why an entry left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// Overwritten by a newer entry under the same key
    Replaced,
    /// Dropped as least recently used to satisfy a capacity bound
    Evicted,
    /// Dropped because it was observed past its max age
    Expired,
    /// Removed on request
    Explicit,
}

// == Removal Listener ==
/// Hook fired once for every entry that leaves an [`EntryStore`].
pub trait RemovalListener {
    fn on_removal(&mut self, key: &str, entry: &CacheEntry, cause: RemovalCause);
}

// == Entry Store ==
/// Map from fingerprint to entry, ordered by recency and bounded by item count.
#[derive(Debug)]
pub struct EntryStore<L> {
    /// Fingerprint to entry storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_items: NonZeroUsize,
    /// Notified of every removal
    listener: L,
}

impl<L: RemovalListener> EntryStore<L> {
    // == Constructor ==
    /// Creates an empty store holding at most `max_items` entries.
    ///
    /// Fails when `max_items` is zero.
    pub fn new(max_items: usize, listener: L) -> Result<Self, CacheError> {
        let max_items =
            NonZeroUsize::new(max_items).ok_or(CacheError::InvalidCapacity(max_items))?;

        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_items,
            listener,
        })
    }

    // == Insert ==
    /// Inserts or replaces the entry for `key` and marks it most recently used.
    ///
    /// A replaced entry is reported as [`RemovalCause::Replaced`]. Inserting a
    /// new key into a full store first evicts the least recently used entry.
    pub fn insert(&mut self, key: String, entry: CacheEntry) {
        if let Some(old) = self.entries.remove(&key) {
            self.listener.on_removal(&key, &old, RemovalCause::Replaced);
        } else if self.entries.len() >= self.max_items.get() {
            self.pop_lru(RemovalCause::Evicted);
        }

        self.lru.touch(&key);
        self.entries.insert(key, entry);
    }

    // == Get ==
    /// Returns the entry for `key`, marking it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        if self.entries.contains_key(key) {
            self.lru.touch(key);
        }
        self.entries.get(key)
    }

    // == Peek ==
    /// Returns the entry for `key` without changing its recency.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Remove ==
    /// Removes the entry for `key`, reporting it with `cause`.
    pub fn remove(&mut self, key: &str, cause: RemovalCause) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.listener.on_removal(key, &entry, cause);
        Some(entry)
    }

    // == Pop LRU ==
    /// Removes the least recently used entry, reporting it with `cause`.
    pub fn pop_lru(&mut self, cause: RemovalCause) -> Option<(String, CacheEntry)> {
        while let Some(key) = self.lru.evict_oldest() {
            if let Some(entry) = self.entries.remove(&key) {
                self.listener.on_removal(&key, &entry, cause);
                return Some((key, entry));
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Sum of payload sizes, computed by walking every entry.
    #[cfg(test)]
    pub(crate) fn payload_bytes(&self) -> u64 {
        self.entries.values().map(CacheEntry::size).sum()
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }
}
