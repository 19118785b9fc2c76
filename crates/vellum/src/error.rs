//! Error types for the client.

use thiserror::Error;

use vellum_core::CoreError;
use vellum_perms::PermsError;
use vellum_repo::{classify_remote_error, RemoteErrorKind, RepoError};
use vellum_session::SessionError;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A malformed or missing identity or document reference. Raised before
    /// any remote call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Network or transport failure, including timeouts.
    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    /// The repository refused a write for lack of privilege.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The document is locked by another identity.
    #[error("document is already locked by user: {owner}")]
    LockConflict { owner: String },

    /// Passed through unchanged from the repository.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Any other unexpected repository response.
    #[error("remote protocol error: {0}")]
    RemoteProtocolError(String),

    /// The directory has no record of this identity.
    #[error("unknown identity: {0}")]
    UnknownIdentity(String),

    /// Writing ACL entries or the rights overlay failed.
    #[error("unable to update permissions on '{path}': {source}")]
    PermissionUpdate {
        path: String,
        #[source]
        source: RepoError,
    },

    /// The client could not start its background sweeper.
    #[error("failed to start client: {0}")]
    Startup(String),
}

impl From<RepoError> for ClientError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Connection(msg) | RepoError::Timeout(msg) => {
                ClientError::ConnectionFailure(msg)
            }
            RepoError::QuotaExceeded(msg) => ClientError::QuotaExceeded(msg),
            RepoError::NotFound(msg) => ClientError::RemoteProtocolError(format!("not found: {msg}")),
            RepoError::Remote { message, .. } => match classify_remote_error(&message) {
                RemoteErrorKind::LockConflict { owner } => ClientError::LockConflict { owner },
                RemoteErrorKind::AuthorizationDenied => ClientError::AuthorizationDenied(message),
                RemoteErrorKind::Protocol => ClientError::RemoteProtocolError(message),
            },
        }
    }
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidArgument(msg) => ClientError::InvalidArgument(msg),
            other => ClientError::RemoteProtocolError(other.to_string()),
        }
    }
}

impl From<PermsError> for ClientError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::ProtectedPrincipal(_) => ClientError::InvalidArgument(err.to_string()),
            PermsError::MalformedOverlay(msg) => ClientError::RemoteProtocolError(msg),
            PermsError::Core(core) => core.into(),
        }
    }
}

impl From<SessionError> for ClientError {
    fn from(err: SessionError) -> Self {
        match err {
            // Authentication rejections count as connection failures too.
            SessionError::Open(_) => ClientError::ConnectionFailure(err.to_string()),
            SessionError::Spawn(io) => ClientError::Startup(io.to_string()),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
