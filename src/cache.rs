//! In-memory result cache with per-entry time-to-live.
//!
//! Eviction is lazy: an expired entry stays in memory until the next `get`
//! for its key observes it. There is no size bound and no background sweeper.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

/// Key/value store where every entry carries its own expiry.
///
/// The `(value, expires_at)` pair is written under a single lock, so a
/// concurrent `get` never observes a half-updated entry. Concurrent `set`s to
/// the same key resolve last-writer-wins.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store `value` under `key`, replacing any existing entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = Instant::now().checked_add(ttl);
        self.lock().insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Number of entries currently held, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // Entries are inserted whole, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<V: Clone> TtlCache<V> {
    /// Return the value for `key` if it has not expired.
    ///
    /// An expired entry is removed before returning `None`.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => entry.expires_at.is_some_and(|at| Instant::now() > at),
        };
        if expired {
            entries.remove(key);
            tracing::debug!(key, "cache entry expired");
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }
}
