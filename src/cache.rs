//! Session-wide caches.
//!
//! [`PatternCache`] maps a normalized query to its compiled [`Pattern`];
//! [`ChunkCache`] maps `(chunk, cache key)` to the items that matched. Both
//! are shared by the scanning workers and guard every read-or-insert with a
//! single mutex. Neither is invalidated implicitly: owners call `clear` when
//! the candidate set is reloaded.

use crate::item::{Chunk, ChunkId, Item};
use crate::query::Pattern;
use ahash::AHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cached data stays consistent even if a holder panicked mid-scan
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Compiled patterns by normalized query text
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: Mutex<AHashMap<String, Arc<Pattern>>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the pattern stored under `key`, building it on first request
    pub fn get_or_insert_with<F>(&self, key: &str, build: F) -> Arc<Pattern>
    where
        F: FnOnce() -> Pattern,
    {
        let mut patterns = lock(&self.patterns);
        if let Some(pattern) = patterns.get(key) {
            return Arc::clone(pattern);
        }
        let pattern = Arc::new(build());
        patterns.insert(key.to_string(), Arc::clone(&pattern));
        pattern
    }

    pub fn len(&self) -> usize {
        lock(&self.patterns).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.patterns).clear();
    }
}

type QueryCache = AHashMap<String, Arc<Vec<Item>>>;

/// Matched items per chunk and cache key.
///
/// Only full chunks are cached: a partially filled chunk may still grow,
/// which would make its stored results incomplete. Empty keys are never
/// stored either, since an empty pattern selects the whole chunk.
#[derive(Debug, Default)]
pub struct ChunkCache {
    entries: Mutex<AHashMap<ChunkId, QueryCache>>,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, chunk: &Chunk, key: &str, results: Arc<Vec<Item>>) {
        if key.is_empty() || !chunk.is_full() {
            return;
        }
        lock(&self.entries)
            .entry(chunk.id())
            .or_default()
            .insert(key.to_string(), results);
    }

    pub fn find(&self, chunk: &Chunk, key: &str) -> Option<Arc<Vec<Item>>> {
        if key.is_empty() || !chunk.is_full() {
            return None;
        }
        lock(&self.entries)
            .get(&chunk.id())
            .and_then(|queries| queries.get(key))
            .map(Arc::clone)
    }

    /// Number of cached (chunk, key) entries
    pub fn len(&self) -> usize {
        lock(&self.entries).values().map(|queries| queries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }
}

/// Counters for result cache lookups
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    ancestor_hits: AtomicU64,
    misses: AtomicU64,
    bypassed: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStatsSnapshot {
    /// Exact key found, no scan
    pub hits: u64,
    /// Scan narrowed to a cached ancestor's results
    pub ancestor_hits: u64,
    /// Full-chunk scan of a cacheable pattern
    pub misses: u64,
    /// Full-chunk scan of a pattern that may not use the cache
    pub bypassed: u64,
}

impl CacheStats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ancestor_hit(&self) {
        self.ancestor_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bypass(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            ancestor_hits: self.ancestor_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.ancestor_hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.bypassed.store(0, Ordering::Relaxed);
    }
}

impl CacheStatsSnapshot {
    /// Share of cacheable lookups that avoided a full-chunk scan
    pub fn reuse_rate(&self) -> f32 {
        let reused = self.hits + self.ancestor_hits;
        let total = reused + self.misses;
        if total == 0 {
            0.0
        } else {
            reused as f32 / total as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::CHUNK_SIZE;
    use crate::query::MatchOptions;

    fn full_chunk() -> Chunk {
        Chunk::from_items((0..CHUNK_SIZE).map(|i| Item::new(i as u32, format!("{}", i))).collect())
    }

    #[test]
    fn test_pattern_cache_identity() {
        let cache = PatternCache::new();
        let options = MatchOptions::default();
        let a = cache.get_or_insert_with("foo", || Pattern::new(&options, "foo"));
        let b = cache.get_or_insert_with("foo", || panic!("rebuilt"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        let c = cache.get_or_insert_with("foo", || Pattern::new(&options, "foo"));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_chunk_cache_find_add() {
        let cache = ChunkCache::new();
        let chunk = full_chunk();
        let results = Arc::new(chunk.items()[..3].to_vec());

        assert!(cache.find(&chunk, "1").is_none());
        cache.add(&chunk, "1", Arc::clone(&results));
        let found = cache.find(&chunk, "1").unwrap();
        assert!(Arc::ptr_eq(&found, &results));
        assert!(cache.find(&chunk, "2").is_none());
        assert!(cache.find(&full_chunk(), "1").is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.find(&chunk, "1").is_none());
    }

    #[test]
    fn test_chunk_cache_skips_partial_chunks_and_empty_keys() {
        let cache = ChunkCache::new();
        let partial = Chunk::from_items(vec![Item::new(0, "a")]);
        cache.add(&partial, "a", Arc::new(Vec::new()));
        assert!(cache.find(&partial, "a").is_none());

        let chunk = full_chunk();
        cache.add(&chunk, "", Arc::new(Vec::new()));
        assert!(cache.find(&chunk, "").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stats_reuse_rate() {
        let stats = CacheStats::default();
        assert_eq!(stats.snapshot().reuse_rate(), 0.0);
        stats.record_hit();
        stats.record_ancestor_hit();
        stats.record_miss();
        stats.record_miss();
        stats.record_bypass();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.bypassed, 1);
        assert!((snapshot.reuse_rate() - 0.5).abs() < f32::EPSILON);

        stats.reset();
        assert_eq!(stats.snapshot(), CacheStatsSnapshot::default());
    }
}
