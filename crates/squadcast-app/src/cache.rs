// Time-expiring in-memory cache for upstream responses.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// `key -> (value, inserted_at)`, checked against a fixed TTL on read.
///
/// Entries are never evicted proactively; a stale entry lingers until the
/// same key is written again. The lock is never held across an `.await`.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (V, Instant)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cached value, if present and younger than the TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some((value, inserted_at)) if inserted_at.elapsed() < self.ttl => {
                debug!("cache hit: {key}");
                Some(value.clone())
            }
            Some(_) => {
                debug!("cache expired: {key}");
                None
            }
            None => {
                debug!("cache miss: {key}");
                None
            }
        }
    }

    /// Store `value`, restarting the entry's clock.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key.into(), (value, Instant::now()));
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
