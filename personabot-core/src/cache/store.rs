// File: personabot-core/src/cache/store.rs

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};

/// A cached value plus the instant it was written.
#[derive(Debug, Clone)]
struct Stamped<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Timestamped map with a freshness window and an opportunistic sweep.
///
/// Both core caches (display names, channel conversations) share this
/// store. Eviction is a bounded-growth heuristic rather than a strict
/// LRU: a sweep only runs on insert once the entry count exceeds the
/// threshold, and it drops every entry older than the TTL in one O(n)
/// pass. The store may temporarily hold more than `sweep_threshold`
/// fresh entries; the point is to stop abandoned keys from growing the
/// map forever.
///
/// Every operation takes `now` explicitly so freshness-window behavior
/// is driven by the caller's clock.
#[derive(Debug)]
pub struct TtlStore<K, V> {
    entries: HashMap<K, Stamped<V>>,
    ttl: Duration,
    sweep_threshold: usize,
}

impl<K: Eq + Hash, V> TtlStore<K, V> {
    pub fn new(ttl_ms: i64, sweep_threshold: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::milliseconds(ttl_ms),
            sweep_threshold,
        }
    }

    /// Returns the cached value if it is still within the freshness
    /// window. A stale entry is left in place for the sweep.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<&V> {
        self.entries.get(key).and_then(|stamped| {
            if now - stamped.stored_at < self.ttl {
                Some(&stamped.value)
            } else {
                None
            }
        })
    }

    /// Overwrites the entry wholesale with a fresh timestamp. When the
    /// store has already grown past the threshold, the insert first
    /// sweeps out everything expired.
    pub fn put(&mut self, key: K, value: V, now: DateTime<Utc>) {
        if self.entries.len() > self.sweep_threshold {
            self.sweep(now);
        }
        self.entries.insert(key, Stamped { value, stored_at: now });
    }

    /// Drops every entry whose age is at least the TTL.
    pub fn sweep(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.entries.retain(|_, stamped| now - stamped.stored_at < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
