//! Token-keyed record cache.
//!
//! Holds resolved [`ReferenceRecord`]s keyed by exact token bytes, with
//! least-recently-used eviction once the capacity is reached.

use std::collections::HashMap;

use super::{ReferenceRecord, ReferenceToken};

struct CachedRecord {
    record: ReferenceRecord,
    last_used: u64,
}

/// Bounded LRU cache of resolved references.
pub struct TokenCache {
    entries: HashMap<ReferenceToken, CachedRecord>,
    /// Maximum number of records (0 = unbounded).
    capacity: usize,
    tick: u64,
}

impl TokenCache {
    /// Create a cache holding at most `capacity` records (0 = unbounded).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            tick: 0,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Get a cached record, marking it as recently used.
    pub fn get(&mut self, token: &ReferenceToken) -> Option<&ReferenceRecord> {
        let tick = self.next_tick();
        self.entries.get_mut(token).map(|entry| {
            entry.last_used = tick;
            &entry.record
        })
    }

    /// Check for a record without touching its recency.
    pub fn contains(&self, token: &ReferenceToken) -> bool {
        self.entries.contains_key(token)
    }

    /// Insert a record, evicting the least recently used one when full.
    pub fn insert(&mut self, record: ReferenceRecord) {
        let key = record.token.clone();
        if self.capacity > 0 && !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        let last_used = self.next_tick();
        self.entries.insert(key, CachedRecord { record, last_used });
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            tracing::trace!("evicting cached reference {:?}", key);
            self.entries.remove(&key);
        }
    }

    /// Clear the entire cache.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(crate::util::Settings::default().reference_cache_capacity)
    }
}
