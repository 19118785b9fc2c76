//! Error types for the permissions module.

use thiserror::Error;

/// Errors that can occur during permission operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermsError {
    /// The rights overlay attribute is not a JSON object.
    #[error("malformed rights overlay: {0}")]
    MalformedOverlay(String),

    /// A change named a principal whose entries are never rewritten.
    #[error("permissions for '{0}' are managed by the repository and can't be changed")]
    ProtectedPrincipal(String),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] vellum_core::CoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
