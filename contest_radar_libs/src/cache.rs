//! Process-local TTL cache with an injectable clock, used for short-lived
//! lookups such as recent handle-verification results.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn put(&self, key: K, value: V, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(key, Entry { value, expires_at });
    }

    /// Returns the live value for `key`, dropping it if its TTL has lapsed.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Evicts every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn starting_at(now: DateTime<Utc>) -> Self {
            Self { now: Mutex::new(now) }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_get_within_ttl() {
        let clock = Arc::new(ManualClock::starting_at(start()));
        let cache: TtlCache<&str, bool> = TtlCache::with_clock(clock.clone());
        cache.put("tourist", true, Duration::minutes(10));
        clock.advance(Duration::minutes(9));
        assert_eq!(cache.get(&"tourist"), Some(true));
    }

    #[test]
    fn test_entry_expires_deterministically() {
        let clock = Arc::new(ManualClock::starting_at(start()));
        let cache: TtlCache<&str, bool> = TtlCache::with_clock(clock.clone());
        cache.put("tourist", true, Duration::minutes(10));
        clock.advance(Duration::minutes(10));
        assert_eq!(cache.get(&"tourist"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired_only_drops_stale_entries() {
        let clock = Arc::new(ManualClock::starting_at(start()));
        let cache: TtlCache<&str, i32> = TtlCache::with_clock(clock.clone());
        cache.put("short", 1, Duration::minutes(1));
        cache.put("long", 2, Duration::hours(1));
        clock.advance(Duration::minutes(5));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get(&"long"), Some(2));
    }

    #[test]
    fn test_put_overwrites_and_refreshes() {
        let clock = Arc::new(ManualClock::starting_at(start()));
        let cache: TtlCache<&str, i32> = TtlCache::with_clock(clock.clone());
        cache.put("key", 1, Duration::minutes(1));
        clock.advance(Duration::seconds(50));
        cache.put("key", 2, Duration::minutes(1));
        clock.advance(Duration::seconds(30));
        assert_eq!(cache.get(&"key"), Some(2));
    }
}
