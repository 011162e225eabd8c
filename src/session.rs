//! Matching session: fixed search options plus the caches that make
//! re-filtering on every keystroke cheap.

use crate::cache::{CacheStats, CacheStatsSnapshot, ChunkCache, PatternCache};
use crate::item::{Chunk, Item};
use crate::query::{MatchOptions, Pattern};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Owns the pattern memo table and the chunk result cache.
///
/// Options never change during a session, which is what makes a query text
/// a sufficient key for its compiled pattern. Sessions are `Sync` and meant
/// to be shared by the workers scanning chunks in parallel.
#[derive(Debug, Default)]
pub struct Session {
    options: MatchOptions,
    patterns: PatternCache,
    results: ChunkCache,
    stats: CacheStats,
}

impl Session {
    pub fn new(options: MatchOptions) -> Self {
        Self {
            options,
            patterns: PatternCache::new(),
            results: ChunkCache::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Compiled pattern for `query`, shared between identical queries
    pub fn build_pattern(&self, query: &str) -> Arc<Pattern> {
        let key = Pattern::normalize(self.options.extended, query);
        self.patterns.get_or_insert_with(key, || {
            let pattern = Pattern::new(&self.options, key);
            debug!(
                query = key,
                groups = pattern.term_sets().len(),
                cacheable = pattern.is_cacheable(),
                "compiled pattern"
            );
            pattern
        })
    }

    /// Items of `chunk` matching `pattern`, in chunk order.
    ///
    /// Cacheable patterns first look up their own key, then the closest
    /// shorter key in a fixed order: for each drop length `d` from 1, the key
    /// without its last `d` chars, then without its first `d` chars. Results
    /// of such an ancestor are a superset of ours, so only they are scanned.
    pub fn match_chunk(&self, pattern: &Pattern, chunk: &Chunk) -> Vec<Item> {
        if pattern.is_empty() {
            return chunk.items().to_vec();
        }

        if !pattern.is_cacheable() {
            self.stats.record_bypass();
            return pattern.match_items(chunk.items());
        }

        let key = pattern.cache_key();
        if let Some(cached) = self.results.find(chunk, &key) {
            trace!(chunk = chunk.id(), key = %key, "result cache hit");
            self.stats.record_hit();
            return cached.as_ref().clone();
        }

        let matches = match self.find_ancestor(pattern, chunk, &key) {
            Some(space) => {
                self.stats.record_ancestor_hit();
                pattern.match_items(&space)
            }
            None => {
                self.stats.record_miss();
                pattern.match_items(chunk.items())
            }
        };

        self.results.add(chunk, &key, Arc::new(matches.clone()));
        matches
    }

    fn find_ancestor(&self, pattern: &Pattern, chunk: &Chunk, key: &str) -> Option<Arc<Vec<Item>>> {
        let chars: Vec<char> = key.chars().collect();
        for drop in 1..chars.len() {
            let cut = chars.len() - drop;
            if !cut_changes_meaning(pattern, &chars, cut, false) {
                let without_suffix: String = chars[..cut].iter().collect();
                if let Some(found) = self.results.find(chunk, &without_suffix) {
                    trace!(chunk = chunk.id(), key = %key, ancestor = %without_suffix, "narrowed scan");
                    return Some(found);
                }
            }
            if !cut_changes_meaning(pattern, &chars, drop, true) {
                let without_prefix: String = chars[drop..].iter().collect();
                if let Some(found) = self.results.find(chunk, &without_prefix) {
                    trace!(chunk = chunk.id(), key = %key, ancestor = %without_prefix, "narrowed scan");
                    return Some(found);
                }
            }
        }
        None
    }

    /// Match every chunk in parallel; results keep chunk order
    pub fn scan(&self, pattern: &Pattern, chunks: &[Arc<Chunk>]) -> Vec<Item> {
        let start = Instant::now();
        let per_chunk: Vec<Vec<Item>> = chunks
            .par_iter()
            .map(|chunk| self.match_chunk(pattern, chunk))
            .collect();
        let matches: Vec<Item> = per_chunk.into_iter().flatten().collect();

        debug!(
            query = pattern.as_str(),
            chunks = chunks.len(),
            matches = matches.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "scan finished"
        );
        matches
    }

    /// Membership test, bypassing the result cache
    pub fn matches(&self, pattern: &Pattern, item: &Item) -> bool {
        pattern.is_empty() || pattern.match_item(item)
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn pattern_cache(&self) -> &PatternCache {
        &self.patterns
    }

    pub fn result_cache(&self) -> &ChunkCache {
        &self.results
    }

    /// Forget compiled patterns
    pub fn clear_patterns(&self) {
        self.patterns.clear();
    }

    /// Forget cached chunk results; required when the candidate set reloads
    pub fn clear_results(&self) {
        self.results.clear();
        self.stats.reset();
    }

    pub fn clear_caches(&self) {
        self.clear_patterns();
        self.clear_results();
    }
}

/// Chars that act as term modifiers at the start of a token
const LEADING_MODIFIERS: [char; 3] = ['!', '\'', '^'];

/// Whether cutting an extended-mode key at `cut` reinterprets the token it
/// splits, so that the shorter key no longer selects a superset.
///
/// With `keep_tail` the candidate is `key[cut..]`, otherwise `key[..cut]`.
/// A literal `^`, `'` or `!` that becomes the first char of a token turns
/// into a modifier, as does a literal `$` that becomes the last char. With
/// exact matching as default, cutting into a `'`-flipped fuzzy token leaves
/// an exact one behind.
fn cut_changes_meaning(pattern: &Pattern, key: &[char], cut: usize, keep_tail: bool) -> bool {
    if !pattern.is_extended() {
        return false;
    }
    let splits_token = !key[cut - 1].is_whitespace() && !key[cut].is_whitespace();
    if !splits_token {
        return false;
    }

    if keep_tail {
        let token_start = key[..cut]
            .iter()
            .rposition(|ch| ch.is_whitespace())
            .map_or(0, |i| i + 1);
        LEADING_MODIFIERS.contains(&key[cut]) || (!pattern.is_fuzzy() && key[token_start] == '\'')
    } else {
        key[cut - 1] == '$'
    }
}
