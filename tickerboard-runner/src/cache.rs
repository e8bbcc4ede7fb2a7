//! In-process result cache with a fixed time-to-live.
//!
//! Entries are keyed by the exact request and expire `ttl` after insertion.
//! Expired entries are evicted lazily on lookup or in bulk with
//! [`TtlCache::purge_expired`]. The lock is held only for the map operation
//! itself, never while a value is being computed.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Freshness window for dashboard results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Time source for expiry checks.
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

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, (V, Instant)>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // Every mutation is a single map call, so a poisoned map is still whole.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, (V, Instant)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, inserted: Instant, now: Instant) -> bool {
        now.saturating_duration_since(inserted) < self.ttl
    }

    /// Fresh value for `key`, if any. An expired entry is removed.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some((value, inserted)) if self.is_fresh(*inserted, now) => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value`, replacing any previous entry and restarting its TTL.
    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        self.lock().insert(key, (value, now));
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key).map(|(value, _)| value)
    }

    /// Drop every expired entry, returning how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, (_, inserted)| self.is_fresh(*inserted, now));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Stored entries, expired ones not yet evicted included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl_secs: u64) -> (TtlCache<String, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(Duration::from_secs(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[test]
    fn hit_before_expiry() {
        let (cache, clock) = cache(300);
        cache.insert("a".into(), 1);
        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn miss_at_and_after_expiry() {
        let (cache, clock) = cache(300);
        cache.insert("a".into(), 1);
        clock.advance(Duration::from_secs(300));
        assert_eq!(cache.get(&"a".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn reinsert_restarts_ttl() {
        let (cache, clock) = cache(10);
        cache.insert("a".into(), 1);
        clock.advance(Duration::from_secs(8));
        cache.insert("a".into(), 2);
        clock.advance(Duration::from_secs(8));
        assert_eq!(cache.get(&"a".to_string()), Some(2));
    }

    #[test]
    fn purge_counts_evictions() {
        let (cache, clock) = cache(10);
        cache.insert("old".into(), 1);
        clock.advance(Duration::from_secs(6));
        cache.insert("new".into(), 2);
        clock.advance(Duration::from_secs(6));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"new".to_string()), Some(2));
    }

    #[test]
    fn remove_and_clear() {
        let (cache, _) = cache(10);
        cache.insert("a".into(), 1);
        cache.insert("b".into(), 2);
        assert_eq!(cache.remove(&"a".to_string()), Some(1));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_inserts() {
        let cache = Arc::new(TtlCache::<u32, u32>::new(DEFAULT_TTL));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        cache.insert(t * 1000 + i, i);
                        assert_eq!(cache.get(&(t * 1000 + i)), Some(i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }

    proptest::proptest! {
        #[test]
        fn fresh_iff_younger_than_ttl(ttl in 1u64..1_000, ages in proptest::collection::vec(0u64..2_000, 1..20)) {
            // Entry i is inserted `ages[i]` seconds before the lookup.
            let (cache, clock) = cache(ttl);
            let oldest = *ages.iter().max().unwrap();
            let mut order: Vec<(usize, u64)> = ages.iter().copied().enumerate().collect();
            order.sort_by_key(|&(_, age)| std::cmp::Reverse(age));
            let mut elapsed = 0;
            for (i, age) in order {
                clock.advance(Duration::from_secs(oldest - age - elapsed));
                elapsed = oldest - age;
                cache.insert(i.to_string(), i as u32);
            }
            clock.advance(Duration::from_secs(oldest - elapsed));
            for (i, &age) in ages.iter().enumerate() {
                let hit = cache.get(&i.to_string());
                proptest::prop_assert_eq!(hit.is_some(), age < ttl);
            }
        }
    }
}
