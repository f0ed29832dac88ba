//! Kernel cache implementation
//!
//! LRU cache for kernel matrix values so the SMO solver does not recompute
//! K(i, j) on every error-cache update. Kernel matrices are symmetric, so the
//! key is normalized to i <= j.

use lru::LruCache;
use std::num::NonZeroUsize;

/// Cache key for kernel values, normalized so that i <= j
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PairKey {
    i: usize,
    j: usize,
}

impl PairKey {
    fn new(i: usize, j: usize) -> Self {
        if i <= j {
            Self { i, j }
        } else {
            Self { i: j, j: i }
        }
    }
}

/// LRU cache for kernel matrix values
pub struct KernelCache {
    cache: LruCache<PairKey, f64>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a cache holding up to `entries` kernel values
    pub fn with_entries(entries: usize) -> Self {
        let capacity = NonZeroUsize::new(entries.max(1)).expect("capacity is at least 1");
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Fetch K(i, j), computing and storing it on a miss
    pub fn get_or_compute<F: FnOnce() -> f64>(&mut self, i: usize, j: usize, compute: F) -> f64 {
        let key = PairKey::new(i, j);
        if let Some(&value) = self.cache.get(&key) {
            self.hits += 1;
            value
        } else {
            self.misses += 1;
            let value = compute();
            self.cache.put(key, value);
            value
        }
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.cache.cap().get(),
            size: self.cache.len(),
        }
    }

    /// Clear the cache and counters
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}
