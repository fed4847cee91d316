//! Decoded overlay cache.
//!
//! Overlay assets are fixed, so each one is decoded once and reused across
//! redraws. Least recently used entries are evicted past `max_entries`.

use std::collections::HashMap;
use std::sync::Arc;

use tiny_skia::Pixmap;

#[derive(Debug)]
struct CacheEntry {
    pixmap: Arc<Pixmap>,
    last_used: u64,
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions.
    pub evictions: u64,
}

/// Decoded overlays keyed by asset path.
#[derive(Debug)]
pub struct OverlayCache {
    entries: HashMap<String, CacheEntry>,
    max_entries: usize,
    clock: u64,
    stats: CacheStats,
}

impl Default for OverlayCache {
    fn default() -> Self {
        // Room for the whole catalog.
        Self::with_capacity(16)
    }
}

impl OverlayCache {
    /// Create a cache holding at most `max_entries` overlays.
    #[must_use]
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.max(1),
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    /// Look up a decoded overlay.
    pub fn get(&mut self, path: &str) -> Option<Arc<Pixmap>> {
        self.clock += 1;
        if let Some(entry) = self.entries.get_mut(path) {
            entry.last_used = self.clock;
            self.stats.hits += 1;
            Some(Arc::clone(&entry.pixmap))
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Store a decoded overlay, evicting the least recently used if full.
    pub fn insert(&mut self, path: String, pixmap: Arc<Pixmap>) {
        self.clock += 1;
        if !self.entries.contains_key(&path) && self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                self.entries.remove(&key);
                self.stats.evictions += 1;
                tracing::trace!(path = %key, "Evicted cached overlay");
            }
        }
        self.entries.insert(
            path,
            CacheEntry {
                pixmap,
                last_used: self.clock,
            },
        );
    }

    /// Number of cached overlays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
