//! The Client: the façade every caller goes through.
//!
//! A client owns the session cache, the user cache, and the thread that
//! sweeps both. Permission and lock operations live in
//! [`resolver`](crate::resolver) and [`lock`](crate::lock).

use std::sync::{Arc, Weak};
use std::time::Instant;

use tracing::{debug, info};

use vellum_core::{Identity, IdentityNormalizer, UserRecord};
use vellum_repo::{Connector, Directory};
use vellum_session::{IdentityCache, SessionCache, SessionStats, Sweeper};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

pub(crate) struct ClientInner<C: Connector, D: Directory> {
    pub(crate) config: ClientConfig,
    pub(crate) normalizer: IdentityNormalizer,
    pub(crate) sessions: SessionCache<C>,
    pub(crate) directory: D,
    pub(crate) users: IdentityCache<UserRecord>,
}

impl<C: Connector, D: Directory> ClientInner<C, D> {
    /// Evict idle sessions and forget whatever was cached for their
    /// identities. User records looked up without a session of their own
    /// (permission queries run as the administrator) expire on the same
    /// idle timeout.
    fn sweep_at(&self, now: Instant) -> Vec<Identity> {
        let evicted = self.sessions.reap_idle_at(now);
        for identity in &evicted {
            self.users.remove(identity);
        }
        let expired = self.users.reap_idle_at(now, self.config.idle_timeout);

        if !evicted.is_empty() || !expired.is_empty() {
            info!(
                evicted = evicted.len(),
                active = self.sessions.len(),
                expired_users = expired.len(),
                "swept idle sessions"
            );
        }
        evicted
    }
}

/// The main Client struct.
///
/// Provides:
/// - Per-identity session acquisition
/// - Effective-permission queries and permission listing
/// - Permission changes (ACL plus rights overlay)
/// - Advisory document locks
///
/// A client is `Sync`; share it between request threads behind an `Arc`.
pub struct Client<C: Connector, D: Directory> {
    pub(crate) inner: Arc<ClientInner<C, D>>,
    sweeper: Option<Sweeper>,
}

impl<C: Connector, D: Directory> Client<C, D> {
    /// Create a client and start its background sweeper.
    pub fn new(connector: C, directory: D, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = IdentityNormalizer::new(config.admin_identity.clone())?;

        let inner = Arc::new(ClientInner {
            sessions: SessionCache::new(connector, config.idle_timeout, config.timeouts),
            normalizer,
            directory,
            users: IdentityCache::new(),
            config,
        });

        let weak: Weak<ClientInner<C, D>> = Arc::downgrade(&inner);
        let sweeper = Sweeper::spawn("vellum-session-sweeper", inner.config.sweep_interval, move || {
            match weak.upgrade() {
                Some(inner) => {
                    inner.sweep_at(Instant::now());
                    true
                }
                None => false,
            }
        })?;

        info!(admin = %inner.config.admin_identity, "client started");
        Ok(Self {
            inner,
            sweeper: Some(sweeper),
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The connector sessions are opened with.
    pub fn connector(&self) -> &C {
        self.inner.sessions.connector()
    }

    /// Canonicalize a raw identity.
    pub fn normalize(&self, raw: &str) -> Result<Identity> {
        Ok(self.inner.normalizer.normalize(raw)?)
    }

    /// Get the session for `identity`, opening one if needed.
    pub fn acquire_session(&self, identity: &str) -> Result<Arc<C::Session>> {
        let identity = self.normalize(identity)?;
        self.session_for(&identity)
    }

    pub(crate) fn session_for(&self, identity: &Identity) -> Result<Arc<C::Session>> {
        Ok(self.inner.sessions.acquire(identity)?)
    }

    pub(crate) fn admin_session(&self) -> Result<Arc<C::Session>> {
        self.session_for(&self.inner.normalizer.admin())
    }

    /// The directory record for `identity`, memoized.
    pub(crate) fn user(&self, identity: &Identity) -> Result<Option<UserRecord>> {
        Ok(self
            .inner
            .users
            .get_or_try_fetch(identity, || self.inner.directory.fetch_user(identity))?)
    }

    /// Like [`user`](Self::user), but a missing record is an error.
    pub(crate) fn require_user(&self, identity: &Identity) -> Result<UserRecord> {
        self.user(identity)?.ok_or_else(|| {
            debug!(identity = %identity, "no directory record");
            ClientError::UnknownIdentity(identity.to_string())
        })
    }

    /// Evict idle sessions now instead of waiting for the sweeper.
    pub fn reap_idle_sessions(&self) -> Vec<Identity> {
        self.inner.sweep_at(Instant::now())
    }

    /// Evict sessions that will be idle past the timeout as of `now`.
    pub fn reap_idle_sessions_at(&self, now: Instant) -> Vec<Identity> {
        self.inner.sweep_at(now)
    }

    /// Session counters.
    pub fn session_stats(&self) -> SessionStats {
        self.inner.sessions.stats()
    }

    /// Number of memoized user records.
    pub fn cached_users(&self) -> usize {
        self.inner.users.len()
    }

    /// Stop the sweeper and close every session.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.shutdown();
            self.inner.sessions.close_all();
            info!("client stopped");
        }
    }
}

impl<C: Connector, D: Directory> Drop for Client<C, D> {
    fn drop(&mut self) {
        self.stop();
    }
}
