//! In-memory TTL cache
//!
//! A plain map from key to `(value, inserted_at)`. Entries are expired when
//! `inserted_at < now - ttl`, so an entry exactly `ttl` old is still served.
//! A cache built with [`TtlCache::strict`] drops it instead.
//! Expired entries are dropped lazily on read and by an explicit linear
//! [`TtlCache::sweep_at`] pass.
//!
//! Every method has an `_at` form taking the current time so expiry can be
//! tested without sleeping. The cache itself is not synchronized; owners
//! wrap it in a lock.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

/// Map with per-entry time-to-live
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    ttl: Duration,
    strict: bool,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            strict: false,
        }
    }

    /// Builder method: an entry exactly `ttl` old counts as expired
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, inserted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let cutoff = now - self.ttl;
        if self.strict {
            inserted_at <= cutoff
        } else {
            inserted_at < cutoff
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Utc::now());
    }

    pub fn insert_at(&mut self, key: K, value: V, now: DateTime<Utc>) {
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
            },
        );
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Utc::now())
    }

    /// Fetch an unexpired value; an expired entry is removed
    pub fn get_at(&mut self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let inserted_at = self.entries.get(key)?.inserted_at;
        if self.is_expired(inserted_at, now) {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    /// Fetch a value together with its insertion time, expired or not
    pub fn peek(&self, key: &K) -> Option<(V, DateTime<Utc>)> {
        self.entries
            .get(key)
            .map(|e| (e.value.clone(), e.inserted_at))
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    pub fn sweep(&mut self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Drop every expired entry, returning how many were removed
    pub fn sweep_at(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.ttl;
        let strict = self.strict;
        let before = self.entries.len();
        self.entries
            .retain(|_, e| if strict { e.inserted_at > cutoff } else { e.inserted_at >= cutoff });
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_get_within_ttl() {
        let mut cache = TtlCache::new(Duration::minutes(10));
        cache.insert_at("a", 1, t0());

        assert_eq!(cache.get_at(&"a", t0() + Duration::minutes(5)), Some(1));
    }

    #[test]
    fn test_entry_at_exact_ttl_is_valid() {
        let mut cache = TtlCache::new(Duration::minutes(10));
        cache.insert_at("a", 1, t0());

        assert_eq!(cache.get_at(&"a", t0() + Duration::minutes(10)), Some(1));
    }

    #[test]
    fn test_strict_cache_drops_entry_at_exact_ttl() {
        let mut cache = TtlCache::new(Duration::minutes(10)).strict();
        cache.insert_at("a", 1, t0());
        cache.insert_at("b", 2, t0());

        let just_before = t0() + Duration::minutes(10) - Duration::milliseconds(1);
        assert_eq!(cache.get_at(&"a", just_before), Some(1));
        assert_eq!(cache.get_at(&"a", t0() + Duration::minutes(10)), None);
        assert_eq!(cache.sweep_at(t0() + Duration::minutes(10)), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_past_ttl_is_dropped() {
        let mut cache = TtlCache::new(Duration::minutes(10));
        cache.insert_at("a", 1, t0());

        let later = t0() + Duration::minutes(10) + Duration::milliseconds(1);
        assert_eq!(cache.get_at(&"a", later), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let mut cache = TtlCache::new(Duration::minutes(10));
        cache.insert_at("old", 1, t0());
        cache.insert_at("new", 2, t0() + Duration::minutes(8));

        let removed = cache.sweep_at(t0() + Duration::minutes(11));
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.peek(&"new").is_some());
    }

    #[test]
    fn test_reinsert_refreshes_timestamp() {
        let mut cache = TtlCache::new(Duration::minutes(10));
        cache.insert_at("a", 1, t0());
        cache.insert_at("a", 2, t0() + Duration::minutes(9));

        assert_eq!(cache.get_at(&"a", t0() + Duration::minutes(15)), Some(2));
    }
}
