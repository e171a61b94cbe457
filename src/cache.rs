// src/cache.rs
//! In-memory key/value cache with per-entry expiry and bounded size.
//!
//! Expired entries are dropped lazily on `get`/`has` or eagerly through
//! [`CacheManager::cleanup`]. When the cache is full, inserting a new key
//! evicts the entry with the fewest hits (first inserted wins ties).
//!
//! All mutating methods take `&mut self`; share an instance across threads
//! behind a `Mutex`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Hand-driven clock for deterministic expiry.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// One cached value.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    /// Absolute epoch-ms after which the entry is stale.
    pub expiry: u64,
    /// Successful reads since insertion.
    pub hits: u64,
    pub created_at: u64,
    /// Insertion sequence; kept when a key is overwritten.
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: u64) -> bool {
        now > self.expiry
    }
}

/// Hit/miss counters and derived rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    /// Percentage of hits over all reads, two decimals; 0 before any read.
    pub hit_rate: f64,
}

pub struct CacheManager<V> {
    entries: HashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
    max_size: usize,
    hits: u64,
    misses: u64,
    next_seq: u64,
    clock: Arc<dyn Clock>,
}

impl<V> std::fmt::Debug for CacheManager<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("size", &self.entries.len())
            .field("default_ttl", &self.default_ttl)
            .field("max_size", &self.max_size)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish_non_exhaustive()
    }
}

impl<V: Clone> Default for CacheManager<V> {
    fn default() -> Self {
        Self::new(Duration::from_millis(300_000), 1000)
    }
}

impl<V: Clone> CacheManager<V> {
    /// Creates a cache on the system clock.
    #[must_use]
    pub fn new(default_ttl: Duration, max_size: usize) -> Self {
        Self::with_clock(default_ttl, max_size, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    #[must_use]
    pub fn with_clock(default_ttl: Duration, max_size: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
            max_size: max_size.max(1),
            hits: 0,
            misses: 0,
            next_seq: 0,
            clock,
        }
    }

    /// Returns a clone of the live value for `key`, counting a hit or a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.hits += 1;
                self.hits += 1;
                Some(entry.data.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Inserts with the default TTL.
    pub fn set(&mut self, key: impl Into<String>, data: V) {
        let ttl = self.default_ttl;
        self.set_with_ttl(key, data, ttl);
    }

    /// Inserts or overwrites `key`. Only a new key can trigger eviction.
    pub fn set_with_ttl(&mut self, key: impl Into<String>, data: V, ttl: Duration) {
        let key = key.into();
        let now = self.clock.now_ms();

        let seq = match self.entries.get(&key) {
            Some(existing) => existing.seq,
            None => {
                if self.entries.len() >= self.max_size {
                    self.evict_lru();
                }
                self.next_seq += 1;
                self.next_seq
            }
        };

        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self.entries.insert(
            key,
            CacheEntry {
                data,
                expiry: now.saturating_add(ttl_ms),
                hits: 0,
                created_at: now,
                seq,
            },
        );
    }

    /// Removes `key`; returns whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drops every entry and zeroes the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Removes every expired entry; returns how many were removed.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(now));
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!("cache cleanup removed {removed} expired entries");
        }
        removed
    }

    /// True iff `key` is present and fresh. Drops it if expired.
    pub fn has(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        match self.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    #[must_use]
    pub fn get_stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if total == 0 {
            0.0
        } else {
            let pct = self.hits as f64 / total as f64 * 100.0;
            (pct * 100.0).round() / 100.0
        };
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.entries.len(),
            hit_rate,
        }
    }

    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    /// All keys in insertion order, stale ones included.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keyed: Vec<(&String, u64)> =
            self.entries.iter().map(|(k, e)| (k, e.seq)).collect();
        keyed.sort_by_key(|(_, seq)| *seq);
        keyed.into_iter().map(|(k, _)| k.clone()).collect()
    }

    /// Raw entry count, stale ones included.
    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Entry metadata without counting a read.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Evicts the entry with the fewest hits. Recency is not consulted.
    fn evict_lru(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, e)| (e.hits, e.seq))
            .map(|(k, _)| k.clone());
        if let Some(key) = victim {
            tracing::debug!("cache full, evicting {key}");
            self.entries.remove(&key);
        }
    }
}
