//! Bounded metadata cache with TTL expiry and LRU eviction.
//!
//! Expiry is lazy: an entry older than the TTL is dropped when it is next
//! looked at. Eviction is eager: inserting a new key into a full cache
//! removes the least recently used entry first. There is no background sweep.
//!
//! The cache itself is not synchronized. Callers sharing it across tasks wrap
//! it in a mutex, since a read promotes the entry and is therefore a write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Time source for entry ages.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.base + offset
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    /// Recency tick; larger is more recent.
    last_used: u64,
}

/// Hit/miss counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

pub struct MetadataCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    tick: u64,
    stats: CacheStats,
}

impl<V: Clone> MetadataCache<V> {
    /// Create a cache on the system clock.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, Arc::new(SystemClock))
    }

    /// A zero capacity is raised to one.
    pub fn with_clock(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity: capacity.max(1),
            clock,
            tick: 0,
            stats: CacheStats::default(),
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn is_expired(&self, entry: &CacheEntry<V>) -> bool {
        self.clock.now().saturating_duration_since(entry.inserted_at) > self.ttl
    }

    /// Drop the entry under `key` if it has outlived the TTL.
    fn expire(&mut self, key: &str) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| self.is_expired(entry));
        if expired {
            self.entries.remove(key);
            self.stats.expirations += 1;
        }
        expired
    }

    /// Look up a live entry and mark it most recently used.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.expire(key);
        let tick = self.next_tick();
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = tick;
                self.stats.hits += 1;
                Some(entry.value.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Insert or overwrite. Overwriting resets the entry's age.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        self.expire(&key);
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
            last_used: self.next_tick(),
        };
        self.entries.insert(key, entry);
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.stats.evictions += 1;
        }
    }

    /// Same expiry rule as `get`, without touching recency.
    pub fn has(&mut self, key: &str) -> bool {
        self.expire(key);
        self.entries.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet looked at.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<V: Clone> Default for MetadataCache<V> {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            DEFAULT_CACHE_CAPACITY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_cache(ttl_secs: u64, capacity: usize) -> (MetadataCache<u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = MetadataCache::with_clock(
            Duration::from_secs(ttl_secs),
            capacity,
            clock.clone() as Arc<dyn Clock>,
        );
        (cache, clock)
    }

    #[test]
    fn test_get_after_set() {
        let (mut cache, _) = manual_cache(300, 10);
        cache.set("tables:false", 1);
        assert_eq!(cache.get("tables:false"), Some(1));
        assert_eq!(cache.get("tables:true"), None);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (mut cache, clock) = manual_cache(300, 10);
        cache.set("k", 1);

        clock.advance(Duration::from_secs(300));
        assert_eq!(cache.get("k"), Some(1), "age equal to ttl is still live");

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.size(), 0, "expired entry is removed on access");
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_has_honors_expiry() {
        let (mut cache, clock) = manual_cache(10, 10);
        cache.set("k", 1);
        assert!(cache.has("k"));
        clock.advance(Duration::from_secs(11));
        assert!(!cache.has("k"));
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_overwrite_refreshes_age() {
        let (mut cache, clock) = manual_cache(10, 10);
        cache.set("k", 1);
        clock.advance(Duration::from_secs(8));
        cache.set("k", 2);
        clock.advance(Duration::from_secs(8));
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let (mut cache, _) = manual_cache(300, 3);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.set("d", 4);

        assert_eq!(cache.size(), 3);
        assert!(!cache.has("a"));
        assert!(cache.has("b"));
        assert!(cache.has("c"));
        assert!(cache.has("d"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_resets_recency() {
        let (mut cache, _) = manual_cache(300, 3);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        assert_eq!(cache.get("a"), Some(1));
        cache.set("d", 4);

        assert!(cache.has("a"));
        assert!(!cache.has("b"));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let (mut cache, _) = manual_cache(300, 2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);

        assert_eq!(cache.size(), 2);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_clear() {
        let (mut cache, _) = manual_cache(300, 10);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.clear();
        assert_eq!(cache.size(), 0);
        assert!(!cache.has("a"));
    }

    #[test]
    fn test_hit_miss_counters() {
        let (mut cache, _) = manual_cache(300, 10);
        cache.get("missing");
        cache.set("k", 1);
        cache.get("k");
        cache.get("k");
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let cache: MetadataCache<u32> = MetadataCache::new(Duration::from_secs(1), 0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_defaults() {
        let cache: MetadataCache<u32> = MetadataCache::default();
        assert_eq!(cache.ttl(), Duration::from_secs(300));
        assert_eq!(cache.capacity(), 100);
    }
}
