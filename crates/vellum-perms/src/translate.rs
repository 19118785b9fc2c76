//! Translation between the ACL/overlay representation and the application's
//! permission vocabulary.

use std::collections::BTreeMap;

use vellum_core::{AccessLevel, Acl, EffectivePermission, TAKE_OVERLAY_VALUE};

use crate::overlay::RightsOverlay;

/// Principal reported for entries granted to the everyone group.
pub const ALL_USERS: &str = "*";

/// How one application permission is stored in the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclRepresentation {
    /// The ACE level to grant, if any.
    pub level: Option<AccessLevel>,
    /// The overlay value to record, if any.
    pub overlay: Option<&'static str>,
}

impl AclRepresentation {
    /// The representation of `permission`.
    ///
    /// Edit is the only permission the ACL expresses above Read; everything
    /// else that grants access is stored as Read, with Take marked in the
    /// overlay.
    pub const fn of(permission: EffectivePermission) -> Self {
        match permission {
            EffectivePermission::None => Self {
                level: None,
                overlay: None,
            },
            EffectivePermission::Take => Self {
                level: Some(AccessLevel::Read),
                overlay: Some(TAKE_OVERLAY_VALUE),
            },
            EffectivePermission::View => Self {
                level: Some(AccessLevel::Read),
                overlay: None,
            },
            EffectivePermission::Edit => Self {
                level: Some(AccessLevel::ReadWrite),
                overlay: None,
            },
        }
    }

    /// The application permission implied by an ACE level and the overlay
    /// entry for the same principal.
    ///
    /// `ReadRemove` has no application counterpart and yields `None`.
    pub fn permission(level: AccessLevel, overlay_entry: Option<&str>) -> Option<EffectivePermission> {
        match level {
            AccessLevel::Everything | AccessLevel::ReadWrite => Some(EffectivePermission::Edit),
            AccessLevel::Read if overlay_entry == Some(TAKE_OVERLAY_VALUE) => {
                Some(EffectivePermission::Take)
            }
            AccessLevel::Read => Some(EffectivePermission::View),
            AccessLevel::ReadRemove => None,
        }
    }
}

/// Every principal's highest application permission on one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionMap {
    entries: BTreeMap<String, EffectivePermission>,
}

impl PermissionMap {
    /// Build the map from a document's ACL and overlay.
    ///
    /// Denied entries are skipped. When a principal carries several entries
    /// (for instance both Read and ReadWrite), the higher one wins. Entries
    /// for `everyone_group` are reported under [`ALL_USERS`].
    pub fn from_acl(acl: &Acl, overlay: &RightsOverlay, everyone_group: &str) -> Self {
        let mut entries: BTreeMap<String, EffectivePermission> = BTreeMap::new();

        for ace in acl.granted_entries() {
            let Some(permission) = AclRepresentation::permission(ace.level, overlay.get(&ace.principal)) else {
                continue;
            };

            let principal = if ace.principal == everyone_group {
                ALL_USERS.to_string()
            } else {
                ace.principal.clone()
            };

            entries
                .entry(principal)
                .and_modify(|current| *current = current.max(permission))
                .or_insert(permission);
        }

        Self { entries }
    }

    /// The permission recorded for `principal`.
    pub fn get(&self, principal: &str) -> EffectivePermission {
        self.entries
            .get(principal)
            .copied()
            .unwrap_or(EffectivePermission::None)
    }

    /// Iterate over `(principal, permission)` pairs in principal order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, EffectivePermission)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of principals with some permission.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no principal has any permission.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
