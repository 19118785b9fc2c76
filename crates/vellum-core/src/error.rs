//! Error types for Vellum Core.

use thiserror::Error;

/// Errors raised while constructing core values.
///
/// These are always local argument problems; nothing in this crate talks to
/// the repository.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A required argument was missing, blank, or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An ACE carried a permission level this layer does not know.
    #[error("unknown access level: {0}")]
    UnknownAccessLevel(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
