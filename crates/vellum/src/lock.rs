//! The lock coordinator: advisory document locks.
//!
//! Locks are taken and released on the caller's own session, so the
//! repository records the caller as the owner.

use tracing::{debug, info};

use vellum_core::{Document, Identity};
use vellum_repo::{classify_remote_error, Connector, Directory, RemoteErrorKind, RemoteSession, RepoError};

use crate::client::Client;
use crate::error::{ClientError, Result};

impl<C: Connector, D: Directory> Client<C, D> {
    /// Lock `document` for `identity`.
    ///
    /// Re-locking a document the caller already holds succeeds without a
    /// remote call. A lock held by anyone else fails with
    /// [`ClientError::LockConflict`], whether `document` already shows it or
    /// the repository reports it (when `document` is stale). A missing write
    /// privilege fails with [`ClientError::AuthorizationDenied`].
    ///
    /// Returns whether the document is locked afterwards.
    pub fn lock_document(&self, identity: &str, document: &Document) -> Result<bool> {
        document.validate()?;
        let identity = self.normalize(identity)?;

        if let Some(owner) = document.lock_owner.as_deref() {
            let owner = self.lock_owner(owner)?;
            if owner == identity {
                debug!(identity = %identity, path = %document.path, "lock already held");
                return Ok(true);
            }
            return Err(ClientError::LockConflict {
                owner: owner.into_string(),
            });
        }

        let session = self.session_for(&identity)?;
        match session.lock(document) {
            Ok(locked) => {
                info!(identity = %identity, path = %document.path, "locked document");
                Ok(locked.is_locked())
            }
            Err(RepoError::Remote { message, .. }) => match classify_remote_error(&message) {
                RemoteErrorKind::LockConflict { owner } => {
                    let owner = self.lock_owner(&owner)?;
                    if owner == identity {
                        return Ok(true);
                    }
                    Err(ClientError::LockConflict {
                        owner: owner.into_string(),
                    })
                }
                RemoteErrorKind::AuthorizationDenied => Err(ClientError::AuthorizationDenied(
                    format!("'{identity}' doesn't have write access to '{}'", document.path),
                )),
                RemoteErrorKind::Protocol => Err(ClientError::RemoteProtocolError(message)),
            },
            Err(other) => Err(other.into()),
        }
    }

    /// Release the lock on `document`.
    ///
    /// The unlock is always requested. Returns whether the document is
    /// unlocked afterwards, which it won't be if another identity holds it.
    pub fn unlock_document(&self, identity: &str, document: &Document) -> Result<bool> {
        document.validate()?;
        let identity = self.normalize(identity)?;

        let unlocked = !self.session_for(&identity)?.unlock(document)?.is_locked();
        debug!(identity = %identity, path = %document.path, unlocked, "unlock requested");
        Ok(unlocked)
    }

    fn lock_owner(&self, raw: &str) -> Result<Identity> {
        self.normalize(raw)
            .map_err(|_| ClientError::RemoteProtocolError(format!("lock owner '{raw}' is not a valid identity")))
    }
}
