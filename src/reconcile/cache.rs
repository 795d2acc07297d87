//! Shared price cache with per-entry expiry
//!
//! Entries expire a fixed time after they were last written and the cache
//! never holds more than `capacity` codes. When it is full, expired entries
//! are dropped first and then the least recently used one.

use crate::reconcile::classifier::{classify, CacheMutation, Classification};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    price: String,
    written_at: Instant,
}

/// Thread-safe map from product code to last observed price
#[derive(Debug)]
pub struct ReconciliationCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl ReconciliationCache {
    /// Creates a cache holding at most `capacity` codes (minimum 1)
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Classifies an observation and applies the resulting write atomically
    ///
    /// The lookup, decision and write happen under one lock, so two runs
    /// observing the same new code cannot both see [`Classification::Created`].
    pub fn reconcile(&self, code: &str, price: &str) -> Classification {
        let mut entries = self.lock();
        let now = Instant::now();

        let previous = self.live_price(&mut entries, code, now);
        let (classification, mutation) = classify(previous.as_deref(), price);

        if let Some(mutation) = mutation {
            self.write(&mut entries, code, &mutation, now);
        }

        classification
    }

    /// Returns the live cached price for `code`, if any
    pub fn get(&self, code: &str) -> Option<String> {
        let mut entries = self.lock();
        self.live_price(&mut entries, code, Instant::now())
    }

    /// Writes a price unconditionally
    pub fn insert(&self, code: &str, price: &str) {
        let mut entries = self.lock();
        let mutation = CacheMutation::Insert(price.to_string());
        self.write(&mut entries, code, &mutation, Instant::now());
    }

    /// Number of entries held, including ones that expired but were not yet dropped
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.duration_since(entry.written_at) >= self.ttl
    }

    fn live_price(
        &self,
        entries: &mut LruCache<String, CacheEntry>,
        code: &str,
        now: Instant,
    ) -> Option<String> {
        let expired = match entries.get(code) {
            Some(entry) if !self.is_expired(entry, now) => return Some(entry.price.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(code);
        }
        None
    }

    fn write(
        &self,
        entries: &mut LruCache<String, CacheEntry>,
        code: &str,
        mutation: &CacheMutation,
        now: Instant,
    ) {
        if !entries.contains(code) && entries.len() == entries.cap().get() {
            self.purge_expired(entries, now);
        }

        entries.put(
            code.to_string(),
            CacheEntry {
                price: mutation.price().to_string(),
                written_at: now,
            },
        );
    }

    fn purge_expired(&self, entries: &mut LruCache<String, CacheEntry>, now: Instant) {
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(code, _)| code.clone())
            .collect();

        for code in expired {
            entries.pop(&code);
        }
    }
}
