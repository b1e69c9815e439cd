use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::time::{Duration, Instant};

/// A value plus the moment it was written. Replaced whole on refresh,
/// never partially updated.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    written: Instant,
    pub written_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            written: Instant::now(),
            written_at: Utc::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.written.elapsed() < ttl
    }
}

/// Single-slot cache guarding one expensive upstream value.
/// Empty until the first successful write; a query before that is
/// "not yet populated", which is distinct from holding a stale value.
pub struct TtlCache<T> {
    slot: RwLock<Option<CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
        }
    }

    pub fn set(&self, value: T) {
        *self.slot.write() = Some(CacheEntry::new(value));
    }

    /// Fresh value only
    pub fn get(&self) -> Option<T> {
        let slot = self.slot.read();
        slot.as_ref()
            .filter(|e| e.is_fresh(self.ttl))
            .map(|e| e.value.clone())
    }

    /// Last stored value regardless of freshness, with a freshness flag.
    /// Only for callers that just watched the upstream refresh fail.
    pub fn get_or_stale(&self) -> Option<(T, bool)> {
        let slot = self.slot.read();
        slot.as_ref()
            .map(|e| (e.value.clone(), e.is_fresh(self.ttl)))
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.slot.read().as_ref().map(|e| e.written_at)
    }

    pub fn next_update(&self) -> Option<DateTime<Utc>> {
        let ttl = chrono::Duration::from_std(self.ttl).ok()?;
        self.last_updated().map(|t| t + ttl)
    }

    pub fn age(&self) -> Option<Duration> {
        self.slot.read().as_ref().map(|e| e.written.elapsed())
    }
}

/// Keyed variant for slow-changing per-entity lookups. The key space
/// (protocol names) is small and bounded in practice, so entries are
/// overwritten on refresh but never evicted.
pub struct KeyedTtlCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    ttl: Duration,
}

impl<T: Clone> KeyedTtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .filter(|e| e.is_fresh(self.ttl))
            .map(|e| e.value.clone())
    }

    pub fn insert(&self, key: String, value: T) {
        self.entries.insert(key, CacheEntry::new(value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
