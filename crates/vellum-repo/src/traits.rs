//! Collaborator traits: the abstract interface to the remote repository.
//!
//! These traits keep the permission and session layers independent of the
//! transport. Every call is a blocking round trip bounded by [`Timeouts`];
//! callers that need concurrency run them on their own threads.

use std::time::Duration;

use vellum_core::{Ace, Acl, Document, DocumentId, Identity, SessionId, UserRecord};

use crate::error::Result;

/// Default connect and read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Fixed per-call timeouts handed to the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_TIMEOUT,
            read: DEFAULT_TIMEOUT,
        }
    }
}

/// Opens authenticated sessions on behalf of an identity.
pub trait Connector: Send + Sync + 'static {
    /// The session type this connector produces.
    type Session: RemoteSession;

    /// Perform the authentication handshake for `identity`.
    ///
    /// Failures are reported as [`RepoError::Connection`](crate::RepoError::Connection)
    /// or [`RepoError::Timeout`](crate::RepoError::Timeout).
    fn open_session(&self, identity: &Identity, timeouts: &Timeouts) -> Result<Self::Session>;
}

/// One authenticated session, bound to a single identity.
///
/// # Design Notes
///
/// - **No per-principal removal**: the ACL can only be cleared as a whole
///   ([`remove_local_acl`](Self::remove_local_acl)) or extended one entry at a
///   time ([`set_ace`](Self::set_ace)).
/// - **Full properties are opt-in**: `fetch_document` only returns the
///   complete property map when asked, since that costs an extra header and
///   a heavier response.
pub trait RemoteSession: Send + Sync + 'static {
    /// Handle identifying this session.
    fn id(&self) -> SessionId;

    /// The identity this session acts as.
    fn identity(&self) -> &Identity;

    /// Fetch a document by path.
    fn fetch_document(&self, path: &str, full_properties: bool) -> Result<Document>;

    /// Fetch a document's ACL, local and inherited groups.
    fn fetch_acl(&self, id: &DocumentId) -> Result<Acl>;

    /// Add an entry to the document's local ACL.
    ///
    /// With `overwrite`, an existing entry for the same principal and level
    /// is replaced rather than duplicated.
    fn set_ace(&self, id: &DocumentId, ace: &Ace, overwrite: bool) -> Result<()>;

    /// Remove every entry from the document's local ACL.
    fn remove_local_acl(&self, id: &DocumentId) -> Result<()>;

    /// Set a string property on a document.
    fn set_property(&self, id: &DocumentId, name: &str, value: &str) -> Result<()>;

    /// Lock a document, returning its updated state.
    fn lock(&self, document: &Document) -> Result<Document>;

    /// Unlock a document, returning its updated state.
    fn unlock(&self, document: &Document) -> Result<Document>;

    /// Close the session. Further calls are undefined.
    fn close(&self);
}

/// The user directory.
pub trait Directory: Send + Sync + 'static {
    /// Fetch a user's record, or `None` if the user does not exist.
    fn fetch_user(&self, identity: &Identity) -> Result<Option<UserRecord>>;
}
