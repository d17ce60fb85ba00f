//! Caching module
//!
//! [`SearchCache`] stores serialized [`SearchResponse`] payloads with a TTL per
//! entry. Expired entries are dropped lazily on read; when the entry count
//! passes the soft cap, expired entries are swept and the oldest remaining
//! ones evicted.

use crate::results::SearchResponse;
use crate::strategy::Strategy;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Soft limit on stored entries
pub const DEFAULT_SOFT_CAP: usize = 100;

/// TTL applied to search responses on write-through
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct CacheEntry {
    payload: Vec<u8>,
    stored_at: DateTime<Utc>,
    ttl: Duration,
    /// Insertion order, breaks ties between equal timestamps
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.stored_at > self.ttl
    }
}

/// Counters exposed for the stats endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

/// TTL cache for search responses
pub struct SearchCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    soft_cap: usize,
    clock: Arc<dyn Clock>,
    seq: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl SearchCache {
    /// Create a cache with the given soft cap on the wall clock
    pub fn new(soft_cap: usize) -> Self {
        Self::with_clock(soft_cap, Arc::new(SystemClock))
    }

    /// Create a cache driven by a custom clock
    pub fn with_clock(soft_cap: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            soft_cap: soft_cap.max(1),
            clock,
            seq: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a response; TTLs under one minute are raised to one minute
    pub fn set(&self, key: &str, payload: &SearchResponse, ttl_minutes: i64) {
        if key.is_empty() {
            return;
        }

        let payload = match serde_json::to_vec(payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to serialize cache payload for {}: {}", key, e);
                return;
            }
        };

        let entry = CacheEntry {
            payload,
            stored_at: self.clock.now(),
            ttl: Duration::minutes(ttl_minutes.max(1)),
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
        };

        let mut entries = self.entries();
        entries.insert(key.to_string(), entry);

        if entries.len() > self.soft_cap {
            self.cleanup(&mut entries);
        }
    }

    /// Look up a response; expired or unreadable entries are removed
    pub fn get(&self, key: &str) -> Option<SearchResponse> {
        if key.is_empty() {
            return None;
        }

        let now = self.clock.now();
        let mut entries = self.entries();

        let expired = match entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            entries.remove(key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let decoded = entries
            .get(key)
            .map(|entry| serde_json::from_slice::<SearchResponse>(&entry.payload));

        match decoded {
            Some(Ok(response)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(response)
            }
            Some(Err(e)) => {
                warn!("Dropping corrupted cache entry {}: {}", key, e);
                entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => None,
        }
    }

    /// Remove a cached response
    pub fn remove(&self, key: &str) {
        self.entries().remove(key);
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of stored entries, expired ones included until swept
    pub fn size(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: self.size(),
        }
    }

    fn cleanup(&self, entries: &mut HashMap<String, CacheEntry>) {
        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));

        if entries.len() > self.soft_cap {
            let mut by_age: Vec<(DateTime<Utc>, u64, String)> = entries
                .iter()
                .map(|(key, entry)| (entry.stored_at, entry.seq, key.clone()))
                .collect();
            by_age.sort();

            let excess = entries.len() - self.soft_cap;
            for (_, _, key) in by_age.into_iter().take(excess) {
                entries.remove(&key);
            }
        }

        let removed = before - entries.len();
        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        debug!("Cache cleanup removed {} entries", removed);
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(DEFAULT_SOFT_CAP)
    }
}

/// Lowercase, trim and collapse internal whitespace
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate a cache key for a query under a strategy
pub fn query_cache_key(query: &str, strategy: &Strategy) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(normalize_query(query).as_bytes());
    hasher.update([0u8]);
    hasher.update(strategy.max_results.to_string().as_bytes());
    hasher.update([
        strategy.fetch_content as u8,
        strategy.use_ai_analysis as u8,
        strategy.provider_set as u8,
    ]);

    format!("{:x}", hasher.finalize())
}
