//! The application's permission vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Overlay value marking a "take but not view/edit" grant.
pub const TAKE_OVERLAY_VALUE: &str = "take";

/// The single highest permission an identity holds over a document.
///
/// Resolution precedence is `Edit > Take > View > None` (see
/// [`EffectivePermission::rank`]). `Take` only ever arises from a `Read`
/// entry plus an overlay marker, so it outranks a plain `View`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectivePermission {
    None,
    Take,
    View,
    Edit,
}

impl EffectivePermission {
    /// All variants, lowest precedence first.
    pub const ALL: [EffectivePermission; 4] = [
        EffectivePermission::None,
        EffectivePermission::View,
        EffectivePermission::Take,
        EffectivePermission::Edit,
    ];

    /// Precedence when several categories are satisfied.
    pub const fn rank(&self) -> u8 {
        match self {
            EffectivePermission::None => 0,
            EffectivePermission::View => 1,
            EffectivePermission::Take => 2,
            EffectivePermission::Edit => 3,
        }
    }

    /// Lower-case name used in logs and serialized forms.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EffectivePermission::None => "none",
            EffectivePermission::Take => TAKE_OVERLAY_VALUE,
            EffectivePermission::View => "view",
            EffectivePermission::Edit => "edit",
        }
    }

    /// The higher-precedence of two permissions.
    pub fn max(self, other: Self) -> Self {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for EffectivePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectivePermission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(EffectivePermission::None),
            "take" => Ok(EffectivePermission::Take),
            "view" => Ok(EffectivePermission::View),
            "edit" => Ok(EffectivePermission::Edit),
            _ => Err(CoreError::InvalidArgument(format!(
                "unknown permission '{}'",
                s
            ))),
        }
    }
}

/// A desired permission target for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionChange {
    /// Give the identity exactly this permission.
    Grant(EffectivePermission),
    /// Remove every permission this layer manages for the identity.
    Revoke,
}

impl PermissionChange {
    /// The change that leaves an identity with `target`.
    ///
    /// A `None` target is a revocation.
    pub fn to(target: EffectivePermission) -> Self {
        match target {
            EffectivePermission::None => PermissionChange::Revoke,
            other => PermissionChange::Grant(other),
        }
    }

    /// The permission an identity holds once the change is applied.
    pub fn target(&self) -> EffectivePermission {
        match self {
            PermissionChange::Grant(p) => *p,
            PermissionChange::Revoke => EffectivePermission::None,
        }
    }

    /// Whether this change removes all access.
    pub fn is_revoke(&self) -> bool {
        matches!(self.target(), EffectivePermission::None)
    }
}

impl From<EffectivePermission> for PermissionChange {
    fn from(target: EffectivePermission) -> Self {
        PermissionChange::to(target)
    }
}
