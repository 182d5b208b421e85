//! Time-boxed cache of resolved spawn candidates.
//!
//! Keys are (strategy tag, candidate count), a deliberately coarse dedup: it
//! skips re-scoring an identically shaped batch inside the TTL window, not a
//! content-addressed lookup. When the size bound would be exceeded the whole
//! cache is cleared rather than evicting per entry.

use crate::scorer::ScoredCandidate;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache key: which strategy produced the batch, and how big it was.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Strategy tag
    pub strategy: String,
    /// Number of candidates in the batch
    pub candidate_count: usize,
}

impl CacheKey {
    /// Creates a cache key.
    #[must_use]
    pub fn new(strategy: impl Into<String>, candidate_count: usize) -> Self {
        Self {
            strategy: strategy.into(),
            candidate_count,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    candidate: ScoredCandidate,
    inserted_at: Instant,
}

/// TTL cache of winning candidates, safe for concurrent use.
#[derive(Debug)]
pub struct SelectionCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SelectionCache {
    /// Creates a cache with the given TTL and size bound.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up a live entry, removing it if it has expired.
    pub fn get(&self, key: &CacheKey, now: Instant) -> Option<ScoredCandidate> {
        let hit = match self.entries.get(key) {
            Some(entry) if now.duration_since(entry.inserted_at) <= self.ttl => {
                Some(entry.candidate.clone())
            }
            Some(_) => None,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        match hit {
            Some(candidate) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(candidate)
            }
            None => {
                self.entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Inserts an entry, clearing the whole cache first when the size bound
    /// would be exceeded.
    pub fn put(&self, key: CacheKey, candidate: ScoredCandidate, now: Instant) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            debug!(entries = self.entries.len(), "selection cache full, clearing");
            self.entries.clear();
        }
        self.entries.insert(
            key,
            CacheEntry {
                candidate,
                inserted_at: now,
            },
        );
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of live entries (expired ones still count until touched).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total hits since construction.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total misses since construction.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Hit rate in `[0, 1]`; zero when nothing was looked up yet.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}
