//! The repository-native access model.
//!
//! A document's ACL is an ordered list of named groups of entries. The group
//! named [`LOCAL_ACL`] holds the entries set directly on the document; every
//! other group is inherited from an ancestor folder and is read-only here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Name of the non-inherited ACL group.
pub const LOCAL_ACL: &str = "local";

/// A repository permission level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessLevel {
    Everything,
    ReadWrite,
    Read,
    ReadRemove,
}

impl AccessLevel {
    /// The repository's spelling of this level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Everything => "Everything",
            AccessLevel::ReadWrite => "ReadWrite",
            AccessLevel::Read => "Read",
            AccessLevel::ReadRemove => "ReadRemove",
        }
    }

    /// Whether this level falls in the Edit category.
    pub const fn grants_edit(&self) -> bool {
        matches!(self, AccessLevel::Everything | AccessLevel::ReadWrite)
    }

    /// Whether this level falls in the View category.
    pub const fn grants_view(&self) -> bool {
        matches!(
            self,
            AccessLevel::Everything | AccessLevel::ReadWrite | AccessLevel::Read
        )
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The repository has been seen to vary the case of these.
        match s.trim().to_ascii_lowercase().as_str() {
            "everything" => Ok(AccessLevel::Everything),
            "readwrite" => Ok(AccessLevel::ReadWrite),
            "read" => Ok(AccessLevel::Read),
            "readremove" => Ok(AccessLevel::ReadRemove),
            _ => Err(CoreError::UnknownAccessLevel(s.to_string())),
        }
    }
}

/// One access control entry.
///
/// `principal` is kept exactly as the repository reports it; it may name a
/// user or a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ace {
    pub principal: String,
    pub level: AccessLevel,
    pub granted: bool,
}

impl Ace {
    /// A granted entry.
    pub fn grant(principal: impl Into<String>, level: AccessLevel) -> Self {
        Self {
            principal: principal.into(),
            level,
            granted: true,
        }
    }

    /// A denied entry.
    pub fn deny(principal: impl Into<String>, level: AccessLevel) -> Self {
        Self {
            principal: principal.into(),
            level,
            granted: false,
        }
    }
}

/// A named group of entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AclGroup {
    pub name: String,
    pub entries: Vec<Ace>,
}

impl AclGroup {
    /// Create an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Whether this is the local (non-inherited) group.
    pub fn is_local(&self) -> bool {
        self.name == LOCAL_ACL
    }
}

/// A document's full access control list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Acl {
    pub groups: Vec<AclGroup>,
}

impl Acl {
    /// Create an empty ACL.
    pub fn new() -> Self {
        Self::default()
    }

    /// The local group, if present.
    pub fn local(&self) -> Option<&AclGroup> {
        self.groups.iter().find(|g| g.is_local())
    }

    /// Entries of the local group (empty if there is none).
    pub fn local_entries(&self) -> &[Ace] {
        self.local().map(|g| g.entries.as_slice()).unwrap_or(&[])
    }

    /// Every entry across all groups, local and inherited, in order.
    pub fn entries(&self) -> impl Iterator<Item = &Ace> {
        self.groups.iter().flat_map(|g| g.entries.iter())
    }

    /// Every granted entry across all groups.
    pub fn granted_entries(&self) -> impl Iterator<Item = &Ace> {
        self.entries().filter(|ace| ace.granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_level_parse() {
        assert_eq!("ReadWrite".parse::<AccessLevel>().unwrap(), AccessLevel::ReadWrite);
        assert_eq!("everything".parse::<AccessLevel>().unwrap(), AccessLevel::Everything);
        assert!(matches!(
            "Browse".parse::<AccessLevel>(),
            Err(CoreError::UnknownAccessLevel(_))
        ));
    }

    #[test]
    fn test_access_level_categories() {
        assert!(AccessLevel::Everything.grants_edit());
        assert!(AccessLevel::ReadWrite.grants_edit());
        assert!(!AccessLevel::Read.grants_edit());
        assert!(AccessLevel::Read.grants_view());
        assert!(!AccessLevel::ReadRemove.grants_view());
        assert!(!AccessLevel::ReadRemove.grants_edit());
    }

    #[test]
    fn test_local_entries() {
        let mut local = AclGroup::new(LOCAL_ACL);
        local.entries.push(Ace::grant("alice", AccessLevel::Read));
        let mut inherited = AclGroup::new("inherited");
        inherited.entries.push(Ace::grant("administrators", AccessLevel::Everything));
        inherited.entries.push(Ace::deny("Everyone", AccessLevel::Everything));

        let acl = Acl {
            groups: vec![inherited, local],
        };

        assert_eq!(acl.local_entries().len(), 1);
        assert_eq!(acl.entries().count(), 3);
        assert_eq!(acl.granted_entries().count(), 2);
    }

    #[test]
    fn test_missing_local_group() {
        let acl = Acl::new();
        assert!(acl.local().is_none());
        assert!(acl.local_entries().is_empty());
    }
}
