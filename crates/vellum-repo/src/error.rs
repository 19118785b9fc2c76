//! Error types for repository operations.

use thiserror::Error;

/// Errors reported by the repository collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// The repository could not be reached, or the session handshake failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A call exceeded its connect or read timeout.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The addressed document or user does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The workspace quota would be exceeded.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Any other non-success response.
    #[error("remote error: {message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },
}

impl RepoError {
    /// Build a [`RepoError::Remote`] without a status code.
    pub fn remote(message: impl Into<String>) -> Self {
        RepoError::Remote {
            status: None,
            message: message.into(),
        }
    }

    /// Whether this is a transport-level failure rather than a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, RepoError::Connection(_) | RepoError::Timeout(_))
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepoError>;
