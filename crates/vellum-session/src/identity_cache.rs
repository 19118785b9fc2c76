//! Identity-keyed memoization for lookups that are safe to repeat.

use std::fmt;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use vellum_core::Identity;

struct Cached<V> {
    value: V,
    last_used: Mutex<Instant>,
}

impl<V> Cached<V> {
    fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            last_used: Mutex::new(now),
        }
    }

    fn touch(&self) {
        *self.last_used.lock() = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_used.lock())
    }
}

/// A concurrent map from identity to a cached value.
///
/// Only found values are cached. A lookup that comes back empty is retried
/// on the next call, so a user created after a miss becomes visible. Every
/// hit refreshes the entry; [`reap_idle_at`](Self::reap_idle_at) drops
/// entries nobody has asked for in a while.
pub struct IdentityCache<V> {
    entries: DashMap<Identity, Cached<V>>,
}

impl<V: Clone> IdentityCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// The cached value for `identity`.
    pub fn get(&self, identity: &Identity) -> Option<V> {
        let entry = self.entries.get(identity)?;
        entry.touch();
        Some(entry.value.clone())
    }

    /// Return the cached value, or run `fetch` and cache what it finds.
    ///
    /// If two callers race, the first insert wins and both see its value.
    pub fn get_or_try_fetch<E>(
        &self,
        identity: &Identity,
        fetch: impl FnOnce() -> Result<Option<V>, E>,
    ) -> Result<Option<V>, E> {
        if let Some(value) = self.get(identity) {
            trace!(identity = %identity, "identity cache hit");
            return Ok(Some(value));
        }

        let Some(value) = fetch()? else {
            return Ok(None);
        };

        let entry = self
            .entries
            .entry(identity.clone())
            .or_insert_with(|| Cached::new(value, Instant::now()));
        entry.touch();
        Ok(Some(entry.value.clone()))
    }

    /// Drop the entry for `identity`.
    pub fn remove(&self, identity: &Identity) -> Option<V> {
        self.entries.remove(identity).map(|(_, cached)| cached.value)
    }

    /// Drop every entry unused for longer than `max_idle` as of `now`.
    /// Returns the dropped identities.
    pub fn reap_idle_at(&self, now: Instant, max_idle: Duration) -> Vec<Identity> {
        let expired: Vec<Identity> = self
            .entries
            .iter()
            .filter(|e| e.value().idle_for(now) > max_idle)
            .map(|e| e.key().clone())
            .collect();

        let mut dropped = Vec::with_capacity(expired.len());
        for identity in expired {
            let removed = self
                .entries
                .remove_if(&identity, |_, cached| cached.idle_for(now) > max_idle);
            if let Some((identity, _)) = removed {
                dropped.push(identity);
            }
        }
        if !dropped.is_empty() {
            debug!(dropped = dropped.len(), "dropped idle identity cache entries");
        }
        dropped
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for IdentityCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for IdentityCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCache")
            .field("len", &self.entries.len())
            .finish()
    }
}
