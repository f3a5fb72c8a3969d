//! Bounded, time-limited cache of resolution results keyed by profile hash.

use crate::config::CacheSettings;
use crate::resolution::ResolutionResult;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    result: ResolutionResult,
    inserted_at: Instant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub entries: usize,
}

/// LRU cache with a per-entry TTL. A capacity of zero disables caching.
pub struct ConfigCache {
    entries: Option<Mutex<LruCache<String, Entry>>>,
    ttl: Duration,
    stats: Mutex<CacheStats>,
}

impl ConfigCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            ttl,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.capacity, Duration::from_secs(settings.ttl_secs))
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn get(&self, key: &str) -> Option<ResolutionResult> {
        let entries = self.entries.as_ref()?;
        let mut entries = entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut stats = self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let fresh = entries
            .get(key)
            .map(|entry| entry.inserted_at.elapsed() < self.ttl);
        match fresh {
            Some(true) => {
                stats.hits += 1;
                entries.get(key).map(|entry| entry.result.clone())
            }
            Some(false) => {
                entries.pop(key);
                stats.expired += 1;
                stats.misses += 1;
                None
            }
            None => {
                stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, key: String, result: ResolutionResult) {
        let Some(entries) = self.entries.as_ref() else {
            return;
        };
        let mut entries = entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.put(
            key,
            Entry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        if let Some(entries) = self.entries.as_ref() {
            entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .as_ref()
            .map(|e| e.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = *self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        stats.entries = self.len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Complexity, Domain};

    fn result(agents: &[&str]) -> ResolutionResult {
        ResolutionResult {
            domain: Domain::Saas,
            complexity: Complexity::Moderate,
            ordered_agents: agents.iter().map(|s| s.to_string()).collect(),
            dependencies: Default::default(),
            warnings: Vec::new(),
            confidence: 1.0,
            needs_manual_review: false,
            removed_agents: Vec::new(),
            fallbacks: Vec::new(),
        }
    }

    #[test]
    fn hit_after_insert() {
        let cache = ConfigCache::new(4, Duration::from_secs(60));
        assert!(cache.get("k").is_none());
        cache.insert("k".into(), result(&["a"]));
        let hit = cache.get("k").unwrap();
        assert_eq!(hit.ordered_agents, vec!["a"]);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache = ConfigCache::new(2, Duration::from_secs(60));
        cache.insert("a".into(), result(&["a"]));
        cache.insert("b".into(), result(&["b"]));
        assert!(cache.get("a").is_some());
        cache.insert("c".into(), result(&["c"]));
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = ConfigCache::new(4, Duration::ZERO);
        cache.insert("k".into(), result(&["a"]));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.stats().expired, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_disables_cache() {
        let cache = ConfigCache::new(0, Duration::from_secs(60));
        assert!(!cache.is_enabled());
        cache.insert("k".into(), result(&["a"]));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn clear_empties_cache() {
        let cache = ConfigCache::from_settings(&CacheSettings::default());
        cache.insert("k".into(), result(&["a"]));
        cache.clear();
        assert!(cache.is_empty());
    }
}
