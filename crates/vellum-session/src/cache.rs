//! The session cache: one long-lived remote session per identity.
//!
//! Lookups and inserts go through a concurrent map without any lock held by
//! this layer. Only session *creation* takes a lock, and it is a single
//! process-wide one, so at most one handshake is in flight at a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use vellum_core::Identity;
use vellum_repo::{Connector, RemoteSession, Timeouts};

use crate::error::{Result, SessionError};

/// A snapshot of the cache's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Sessions opened and kept.
    pub created: u64,
    /// Sessions closed, either as a losing duplicate or after going idle.
    pub closed: u64,
    /// Sessions currently cached.
    pub active: u64,
    /// Total successful acquisitions.
    pub uses: u64,
}

#[derive(Default)]
struct Counters {
    created: AtomicU64,
    closed: AtomicU64,
    uses: AtomicU64,
}

struct SessionEntry<S> {
    session: Arc<S>,
    last_used: Mutex<Instant>,
}

impl<S> SessionEntry<S> {
    fn new(session: S) -> Self {
        Self {
            session: Arc::new(session),
            last_used: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_used.lock() = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_used.lock())
    }
}

/// Maps normalized identities to authenticated sessions.
pub struct SessionCache<C: Connector> {
    connector: C,
    sessions: DashMap<Identity, Arc<SessionEntry<C::Session>>>,
    creation_lock: Mutex<()>,
    idle_timeout: Duration,
    timeouts: Timeouts,
    counters: Counters,
}

impl<C: Connector> SessionCache<C> {
    /// Create an empty cache.
    pub fn new(connector: C, idle_timeout: Duration, timeouts: Timeouts) -> Self {
        Self {
            connector,
            sessions: DashMap::new(),
            creation_lock: Mutex::new(()),
            idle_timeout,
            timeouts,
            counters: Counters::default(),
        }
    }

    /// The connector sessions are opened with.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Get the session for `identity`, opening one if needed.
    ///
    /// Every successful call refreshes the session's last-used time. A
    /// failed handshake is not cached; the next call tries again.
    pub fn acquire(&self, identity: &Identity) -> Result<Arc<C::Session>> {
        if let Some(session) = self.cached(identity) {
            debug!(identity = %identity, "session cache hit");
            return Ok(session);
        }

        let _guard = self.creation_lock.lock();

        // Another caller may have finished the handshake while we waited.
        if let Some(session) = self.cached(identity) {
            debug!(identity = %identity, "session created by concurrent caller");
            return Ok(session);
        }

        let session = self
            .connector
            .open_session(identity, &self.timeouts)
            .map_err(SessionError::Open)?;
        let fresh = Arc::new(SessionEntry::new(session));

        // The winner is touched while its map entry is still locked, so a
        // concurrent reap can't close it in between.
        let winner = match self.sessions.entry(identity.clone()) {
            Entry::Occupied(existing) => {
                existing.get().touch();
                let winner = Arc::clone(&existing.get().session);
                drop(existing);
                fresh.session.close();
                self.counters.closed.fetch_add(1, Ordering::Relaxed);
                debug!(identity = %identity, "discarded duplicate session");
                winner
            }
            Entry::Vacant(vacant) => {
                let winner = Arc::clone(&fresh.session);
                vacant.insert(fresh);
                self.counters.created.fetch_add(1, Ordering::Relaxed);
                info!(identity = %identity, session = %winner.id(), "opened session");
                winner
            }
        };

        self.counters.uses.fetch_add(1, Ordering::Relaxed);
        Ok(winner)
    }

    /// Look up a cached session and refresh its last-used time.
    ///
    /// The touch happens under the map's read guard. Reaping removes through
    /// the write side, so a session handed out here was live when touched.
    fn cached(&self, identity: &Identity) -> Option<Arc<C::Session>> {
        let entry = self.sessions.get(identity)?;
        entry.touch();
        let session = Arc::clone(&entry.session);
        drop(entry);
        self.counters.uses.fetch_add(1, Ordering::Relaxed);
        Some(session)
    }

    /// Evict and close every session idle for longer than the idle timeout
    /// as of `now`. Returns the evicted identities.
    pub fn reap_idle_at(&self, now: Instant) -> Vec<Identity> {
        let expired: Vec<Identity> = self
            .sessions
            .iter()
            .filter(|e| e.value().idle_for(now) > self.idle_timeout)
            .map(|e| e.key().clone())
            .collect();

        let mut evicted = Vec::with_capacity(expired.len());
        for identity in expired {
            // Re-check: the session may have been used since the scan.
            let removed = self
                .sessions
                .remove_if(&identity, |_, entry| entry.idle_for(now) > self.idle_timeout);

            if let Some((identity, entry)) = removed {
                entry.session.close();
                self.counters.closed.fetch_add(1, Ordering::Relaxed);
                info!(identity = %identity, "evicted idle session");
                evicted.push(identity);
            }
        }
        evicted
    }

    /// Evict idle sessions as of now.
    pub fn reap_idle(&self) -> Vec<Identity> {
        self.reap_idle_at(Instant::now())
    }

    /// Close and drop every cached session.
    pub fn close_all(&self) {
        let identities: Vec<Identity> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for identity in identities {
            if let Some((_, entry)) = self.sessions.remove(&identity) {
                entry.session.close();
                self.counters.closed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Whether a session is cached for `identity`.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.sessions.contains_key(identity)
    }

    /// Number of cached sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is cached.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// The configured idle timeout.
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Snapshot the counters.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            created: self.counters.created.load(Ordering::Relaxed),
            closed: self.counters.closed.load(Ordering::Relaxed),
            active: self.sessions.len() as u64,
            uses: self.counters.uses.load(Ordering::Relaxed),
        }
    }
}
