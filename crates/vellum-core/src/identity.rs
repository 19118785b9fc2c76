//! Identities and the normalizer that produces them.
//!
//! The repository compares principal names case-sensitively, while the
//! application treats them case-insensitively. Every identity is therefore
//! lower-cased before it reaches the repository, with one exception: the
//! configured administrator identity keeps its exact spelling.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The administrator identity used when none is configured.
pub const DEFAULT_ADMIN_IDENTITY: &str = "Administrator";

/// A normalized principal name.
///
/// Only [`IdentityNormalizer`] constructs these from user input, so holding an
/// `Identity` means the case rules have already been applied.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Get the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identity, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether a raw ACE principal names this identity, ignoring case.
    pub fn matches_principal(&self, principal: &str) -> bool {
        self.0 == principal || self.0.to_lowercase() == principal.to_lowercase()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalizes raw identity strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityNormalizer {
    admin: String,
}

impl IdentityNormalizer {
    /// Create a normalizer for the given administrator identity.
    ///
    /// The administrator identity is stored verbatim; it must not be blank.
    pub fn new(admin: impl Into<String>) -> Result<Self> {
        let admin = admin.into();
        if admin.trim().is_empty() {
            return Err(CoreError::InvalidArgument(
                "the administrator identity can't be empty".into(),
            ));
        }
        Ok(Self { admin })
    }

    /// The administrator identity, already in normalized form.
    pub fn admin(&self) -> Identity {
        Identity(self.admin.clone())
    }

    /// Whether `identity` is the administrator.
    pub fn is_admin(&self, identity: &Identity) -> bool {
        identity.0 == self.admin
    }

    /// Normalize a raw identity.
    ///
    /// Lower-cases `raw` unless it equals the administrator identity exactly.
    /// Blank input is rejected before any remote call can be attempted.
    pub fn normalize(&self, raw: &str) -> Result<Identity> {
        if raw.trim().is_empty() {
            return Err(CoreError::InvalidArgument(
                "identity can't be null or empty".into(),
            ));
        }

        if raw == self.admin {
            return Ok(Identity(raw.to_string()));
        }

        Ok(Identity(raw.to_lowercase()))
    }
}

impl Default for IdentityNormalizer {
    fn default() -> Self {
        Self {
            admin: DEFAULT_ADMIN_IDENTITY.to_string(),
        }
    }
}
