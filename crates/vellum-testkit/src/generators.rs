//! Proptest generators for property-based testing.

use proptest::prelude::*;

use vellum_core::{AccessLevel, Ace, EffectivePermission, PermissionChange};

use crate::fixtures::ADMIN;

/// Generate an application permission.
pub fn effective_permission() -> impl Strategy<Value = EffectivePermission> {
    prop_oneof![
        Just(EffectivePermission::None),
        Just(EffectivePermission::Take),
        Just(EffectivePermission::View),
        Just(EffectivePermission::Edit),
    ]
}

/// Generate a permission change (grant or revoke).
pub fn permission_change() -> impl Strategy<Value = PermissionChange> {
    effective_permission().prop_map(PermissionChange::to)
}

/// Generate a repository access level.
pub fn access_level() -> impl Strategy<Value = AccessLevel> {
    prop_oneof![
        Just(AccessLevel::Everything),
        Just(AccessLevel::ReadWrite),
        Just(AccessLevel::Read),
        Just(AccessLevel::ReadRemove),
    ]
}

/// Generate a raw identity with arbitrary case.
pub fn raw_identity() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9._-]{0,15}".prop_filter("the administrator", |s| s != ADMIN)
}

/// Generate an already-normalized principal that none of the fixture's
/// users or groups use.
pub fn unrelated_principal() -> impl Strategy<Value = String> {
    "ext-[a-z0-9]{1,8}"
}

/// Generate an entry for an unrelated principal.
pub fn unrelated_ace() -> impl Strategy<Value = Ace> {
    (unrelated_principal(), access_level(), any::<bool>()).prop_map(|(principal, level, granted)| {
        Ace {
            principal,
            level,
            granted,
        }
    })
}

/// Generate a handful of entries for unrelated principals.
pub fn unrelated_aces(max: usize) -> impl Strategy<Value = Vec<Ace>> {
    prop::collection::vec(unrelated_ace(), 0..=max)
}
