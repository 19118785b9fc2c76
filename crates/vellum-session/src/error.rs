//! Error types for the session layer.

use thiserror::Error;

use vellum_repo::RepoError;

/// Errors that can occur while managing sessions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session handshake failed, whatever the repository reported.
    /// Never cached; the next acquire retries.
    #[error("unable to open session: {0}")]
    Open(#[source] RepoError),

    /// The background sweeper thread could not be started.
    #[error("failed to start sweeper: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
