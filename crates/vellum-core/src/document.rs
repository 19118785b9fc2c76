//! Documents and user records as this layer sees them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::identity::Identity;
use crate::types::DocumentId;

/// Property holding the JSON rights overlay.
pub const RIGHTS_PROPERTY: &str = "dc:rights";

/// Property holding a document's last-modified timestamp.
pub const MODIFIED_PROPERTY: &str = "dc:modified";

/// A repository document (file or folder).
///
/// `properties` is only fully populated when the document was fetched with
/// full-property retrieval enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub path: String,
    pub lock_owner: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Document {
    /// Create an unlocked document with no properties.
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(id),
            path: path.into(),
            lock_owner: None,
            properties: BTreeMap::new(),
        }
    }

    /// Whether the document currently carries a lock.
    pub fn is_locked(&self) -> bool {
        self.lock_owner.is_some()
    }

    /// Get a property value.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Check that this is a usable document reference.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_blank() {
            return Err(CoreError::InvalidArgument(format!(
                "document '{}' has no id",
                self.path
            )));
        }
        if self.path.trim().is_empty() {
            return Err(CoreError::InvalidArgument(format!(
                "document {} has no path",
                self.id
            )));
        }
        Ok(())
    }
}

/// A user's directory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub identity: Identity,
    pub groups: BTreeSet<String>,
}

impl UserRecord {
    /// Whether an ACE principal names this user or one of its groups.
    ///
    /// The user name is compared exactly (it is already normalized); group
    /// names are compared exactly as the directory reports them.
    pub fn is_named_by(&self, principal: &str) -> bool {
        self.identity.as_str() == principal || self.groups.contains(principal)
    }
}
