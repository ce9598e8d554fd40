//! Route match caching.
//!
//! This module provides [`MatchCache`], an LRU-based cache that avoids
//! re-running the matcher for pathnames the store has already seen. It is
//! gated behind the `cache` feature flag and uses the [`lru`] crate
//! internally.
//!
//! Entries are keyed by the encoded pathname and hold the query-independent
//! [`RouteMatch`]; callers overlay the query with [`RouteMatch::with_query`].
//! The route table is immutable once compiled, so entries never go stale.
//!
//! [`CacheStats`] tracks hits, misses, and invalidations so you can monitor
//! cache effectiveness at runtime.
//!
//! # Examples
//!
//! ```
//! use navstate::cache::MatchCache;
//! use navstate::{match_segments, NavigatorConfig, RouteTable, RouterConfig};
//!
//! let table = RouteTable::new(NavigatorConfig::stack().screen("page"), &RouterConfig::default()).unwrap();
//! let mut cache = MatchCache::with_capacity(16).unwrap();
//!
//! let segments = vec!["page".to_string()];
//! assert!(cache.get("/page").is_none());
//! cache.insert("/page".to_string(), match_segments(&table, &segments));
//!
//! assert_eq!(cache.get("/page").unwrap().name(), "page");
//! assert_eq!(cache.stats().hits, 1);
//! assert_eq!(cache.stats().misses, 1);
//! ```

use crate::resolve::RouteMatch;
use crate::{debug_log, trace_log};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Counters tracking cache hit/miss rates and invalidations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups answered from the cache.
    pub hits: usize,
    /// Number of lookups that had to run the matcher.
    pub misses: usize,
    /// Number of full cache invalidations (via [`MatchCache::clear`]).
    pub invalidations: usize,
}

impl CacheStats {
    /// Return the hit rate as a value in `0.0..=1.0`.
    ///
    /// Returns `0.0` if no lookups have been performed.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache from pathname to segment match.
#[derive(Debug)]
pub struct MatchCache {
    entries: LruCache<String, RouteMatch>,
    stats: CacheStats,
}

impl MatchCache {
    /// Create a cache holding at most `capacity` pathnames.
    ///
    /// Returns `None` for a zero capacity, which callers treat as "caching
    /// disabled".
    pub fn with_capacity(capacity: usize) -> Option<Self> {
        let cap = NonZeroUsize::new(capacity)?;
        Some(Self {
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        })
    }

    /// Look up the cached match for `pathname`, updating hit/miss stats.
    pub fn get(&mut self, pathname: &str) -> Option<RouteMatch> {
        if let Some(entry) = self.entries.get(pathname) {
            self.stats.hits += 1;
            trace_log!("Match cache hit for '{}'", pathname);
            Some(entry.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Match cache miss for '{}'", pathname);
            None
        }
    }

    /// Insert a segment match.
    pub fn insert(&mut self, pathname: String, route_match: RouteMatch) {
        trace_log!("Caching '{}' -> '{}'", pathname, route_match.name());
        self.entries.push(pathname, route_match);
    }

    /// Drop every entry and increment the invalidation counter.
    pub fn clear(&mut self) {
        let len = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += 1;
        debug_log!(
            "Match cache cleared: {} entries removed ({} total invalidations, hit rate: {:.1}%)",
            len,
            self.stats.invalidations,
            self.stats.hit_rate() * 100.0
        );
    }

    /// Current statistics.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset all counters in [`CacheStats`] to zero.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Number of cached pathnames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{match_segments, NavigatorConfig, RouteTable, RouterConfig};

    fn sample() -> RouteMatch {
        let table = RouteTable::new(
            NavigatorConfig::stack().screen("a"),
            &RouterConfig::default(),
        )
        .unwrap();
        match_segments(&table, &["a".to_string()])
    }

    #[test]
    fn test_zero_capacity_disables() {
        assert!(MatchCache::with_capacity(0).is_none());
    }

    #[test]
    fn test_cache_miss() {
        let mut cache = MatchCache::with_capacity(4).unwrap();
        assert!(cache.get("/a").is_none());
        assert_eq!(cache.stats().misses, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = MatchCache::with_capacity(4).unwrap();
        cache.insert("/a".to_string(), sample());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = MatchCache::with_capacity(2).unwrap();
        cache.insert("/1".to_string(), sample());
        cache.insert("/2".to_string(), sample());
        cache.get("/1");
        cache.insert("/3".to_string(), sample());

        assert!(cache.get("/2").is_none());
        assert!(cache.get("/1").is_some());
        assert!(cache.get("/3").is_some());
    }

    #[test]
    fn test_hit_rate_calculation() {
        let mut cache = MatchCache::with_capacity(8).unwrap();
        cache.get("/a");
        cache.get("/b");
        cache.get("/c");

        cache.insert("/a".to_string(), sample());
        cache.insert("/b".to_string(), sample());

        cache.get("/a");
        cache.get("/b");

        assert_eq!(cache.stats().hits, 2);
        assert_eq!(cache.stats().misses, 3);
        assert!((cache.stats().hit_rate() - 0.4).abs() < 0.001);

        cache.reset_stats();
        assert_eq!(cache.stats().hits, 0);
    }
}
