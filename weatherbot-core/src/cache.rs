use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::debug;

/// Key-value store with per-entry expiry.
pub trait Cache<V>: Send + Sync + Debug {
    /// Returns the value only while it is still fresh.
    fn get(&self, key: &str) -> Option<V>;

    fn put(&self, key: &str, value: V, ttl: Duration);
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// In-process cache guarded by a mutex. Expired entries are dropped on read
/// and whenever a new value is stored.
#[derive(Debug)]
pub struct MemoryCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone + Send + Debug> Cache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        // A poisoned lock only means another caller panicked mid-update;
        // treat it as a miss.
        let mut entries = self.entries.lock().ok()?;

        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => {
                debug!(key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(key, "cache entry expired");
                entries.remove(key);
                None
            }
            None => {
                debug!(key, "cache miss");
                None
            }
        }
    }

    fn put(&self, key: &str, value: V, ttl: Duration) {
        let now = Instant::now();
        let Some(expires_at) = now.checked_add(ttl) else {
            return;
        };
        if let Ok(mut entries) = self.entries.lock() {
            let before = entries.len();
            entries.retain(|_, entry| now < entry.expires_at);
            if entries.len() < before {
                debug!(pruned = before - entries.len(), "dropped expired cache entries");
            }
            entries.insert(key.to_string(), Entry { value, expires_at });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_returned() {
        let cache = MemoryCache::new();
        cache.put("seattle", 25_u32, Duration::from_secs(600));

        assert_eq!(cache.get("seattle"), Some(25));
    }

    #[test]
    fn missing_key_is_none() {
        let cache: MemoryCache<u32> = MemoryCache::new();
        assert_eq!(cache.get("nonexistentcity"), None);
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let cache = MemoryCache::new();
        cache.put("boston", 20_u32, Duration::ZERO);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("boston"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn put_prunes_other_expired_entries() {
        let cache = MemoryCache::new();
        for city in ["denver", "austin", "lima"] {
            cache.put(city, 1_u32, Duration::ZERO);
        }
        cache.put("oslo", 2_u32, Duration::from_secs(60));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("oslo"), Some(2));
    }

    #[test]
    fn unrepresentable_ttl_is_not_stored() {
        let cache = MemoryCache::new();
        cache.put("oslo", 2_u32, Duration::MAX);
        assert!(cache.is_empty());
    }

    #[test]
    fn put_replaces_previous_value() {
        let cache = MemoryCache::new();
        cache.put("oslo", 1_u32, Duration::from_secs(60));
        cache.put("oslo", 2_u32, Duration::from_secs(60));

        assert_eq!(cache.get("oslo"), Some(2));
    }
}
