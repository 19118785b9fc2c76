//! Permission-change planning.
//!
//! The repository can only clear a document's whole local ACL or add single
//! entries; it cannot drop one principal's entries. A change is therefore
//! planned as: clear the local ACL (only if a named identity already has a
//! local entry), re-apply every other local entry, then add the new entries.
//! Overlay edits are folded into a single rewrite.
//!
//! The plan is computed against the *prior* overlay and reproduces this
//! table of prior x desired outcomes:
//!
//! ```text
//! prior \ desired | None             | Take                         | View                       | Edit
//! None            | -                | add overlay                  | add Read                   | add ReadWrite
//! Take            | remove overlay   | -                            | remove overlay, keep Read  | remove overlay, Read->ReadWrite
//! View            | remove Read      | add overlay, keep Read       | -                          | Read->ReadWrite
//! Edit            | remove ReadWrite | add overlay, ReadWrite->Read | ReadWrite->Read            | -
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use vellum_core::{Ace, Identity, PermissionChange, TAKE_OVERLAY_VALUE};

use crate::error::{PermsError, Result};
use crate::overlay::RightsOverlay;
use crate::translate::AclRepresentation;

/// The remote steps needed to apply a set of permission changes.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionPlan {
    /// Whether the document's local ACL has to be cleared first.
    pub clear_local: bool,
    /// Local entries to re-apply after the clear. Empty when not clearing.
    pub restore: Vec<Ace>,
    /// Local entries being dropped because their principal is changing.
    pub replaced: Vec<Ace>,
    /// New entries to add, one per identity that keeps some access.
    pub grants: Vec<Ace>,
    /// The rewritten overlay, present only if any entry changed.
    pub overlay: Option<RightsOverlay>,
}

impl PermissionPlan {
    /// Plan `changes` against a document's current local entries and overlay.
    ///
    /// `protected` lists principals (the administrator identity and the
    /// administrators group) whose entries this layer never rewrites; naming
    /// one in `changes` is rejected. Protected names are compared verbatim,
    /// so a regular user spelled like the administrator in another case is
    /// still allowed.
    pub fn build(
        local: &[Ace],
        prior_overlay: &RightsOverlay,
        changes: &BTreeMap<Identity, PermissionChange>,
        protected: &[&str],
    ) -> Result<Self> {
        if let Some(identity) = changes
            .keys()
            .find(|id| protected.contains(&id.as_str()))
        {
            return Err(PermsError::ProtectedPrincipal(identity.to_string()));
        }

        let mut replaced = Vec::new();
        let mut preserved: Vec<Ace> = Vec::new();
        for ace in local {
            let is_protected = protected.contains(&ace.principal.as_str());
            if !is_protected && changes.keys().any(|id| id.matches_principal(&ace.principal)) {
                replaced.push(ace.clone());
            } else if !preserved.contains(ace) {
                preserved.push(ace.clone());
            }
        }

        let clear_local = !replaced.is_empty();
        let restore = if clear_local { preserved } else { Vec::new() };

        let mut grants = Vec::new();
        let mut overlay = prior_overlay.clone();
        let mut overlay_changed = false;

        for (identity, change) in changes {
            let target = change.target();
            let repr = AclRepresentation::of(target);

            if let Some(level) = repr.level {
                grants.push(Ace::grant(identity.as_str(), level));
            }

            let had_take = prior_overlay.grants_take(identity.as_str());
            if change.is_revoke() {
                overlay_changed |= overlay.remove(identity.as_str());
            } else if repr.overlay.is_some() && !had_take {
                overlay.set(identity.as_str(), TAKE_OVERLAY_VALUE);
                overlay_changed = true;
            } else if had_take && repr.overlay.is_none() {
                overlay_changed |= overlay.remove(identity.as_str());
            }

            debug!(identity = %identity, target = %target, had_take, "planned permission change");
        }

        Ok(Self {
            clear_local,
            restore,
            replaced,
            grants,
            overlay: overlay_changed.then_some(overlay),
        })
    }

    /// Whether applying the plan touches the repository at all.
    pub fn is_noop(&self) -> bool {
        !self.clear_local && self.grants.is_empty() && self.overlay.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::convert::Infallible;
    use vellum_core::{
        AccessLevel, Acl, AclGroup, EffectivePermission, IdentityNormalizer, UserRecord, LOCAL_ACL,
    };

    use crate::evaluate::AclVerdict;

    const PROTECTED: &[&str] = &["Administrator", "administrators"];

    fn id(name: &str) -> Identity {
        IdentityNormalizer::default().normalize(name).unwrap()
    }

    fn changes(pairs: &[(&str, EffectivePermission)]) -> BTreeMap<Identity, PermissionChange> {
        pairs
            .iter()
            .map(|(name, p)| (id(name), PermissionChange::to(*p)))
            .collect()
    }

    #[test]
    fn test_new_identity_does_not_clear() {
        let local = vec![Ace::grant("bob", AccessLevel::ReadWrite)];
        let plan = PermissionPlan::build(
            &local,
            &RightsOverlay::new(),
            &changes(&[("alice", EffectivePermission::View)]),
            PROTECTED,
        )
        .unwrap();

        assert!(!plan.clear_local);
        assert!(plan.restore.is_empty());
        assert_eq!(plan.grants, vec![Ace::grant("alice", AccessLevel::Read)]);
        assert!(plan.overlay.is_none());
    }

    #[test]
    fn test_existing_identity_clears_and_restores_others() {
        let local = vec![
            Ace::grant("Alice", AccessLevel::Read),
            Ace::grant("bob", AccessLevel::ReadWrite),
            Ace::grant("bob", AccessLevel::ReadWrite),
            Ace::deny("carol", AccessLevel::Read),
        ];
        let plan = PermissionPlan::build(
            &local,
            &RightsOverlay::new(),
            &changes(&[("alice", EffectivePermission::Edit)]),
            PROTECTED,
        )
        .unwrap();

        assert!(plan.clear_local);
        assert_eq!(plan.replaced, vec![Ace::grant("Alice", AccessLevel::Read)]);
        assert_eq!(
            plan.restore,
            vec![
                Ace::grant("bob", AccessLevel::ReadWrite),
                Ace::deny("carol", AccessLevel::Read),
            ]
        );
        assert_eq!(plan.grants, vec![Ace::grant("alice", AccessLevel::ReadWrite)]);
    }

    #[test]
    fn test_take_adds_overlay_and_read() {
        let plan = PermissionPlan::build(
            &[],
            &RightsOverlay::new(),
            &changes(&[("alice", EffectivePermission::Take)]),
            PROTECTED,
        )
        .unwrap();

        assert_eq!(plan.grants, vec![Ace::grant("alice", AccessLevel::Read)]);
        assert_eq!(plan.overlay.unwrap().to_json(), r#"{"alice":"take"}"#);
    }

    #[test]
    fn test_take_to_take_leaves_overlay_alone() {
        let prior = RightsOverlay::parse(r#"{"alice":"take"}"#).unwrap();
        let plan = PermissionPlan::build(
            &[Ace::grant("alice", AccessLevel::Read)],
            &prior,
            &changes(&[("alice", EffectivePermission::Take)]),
            PROTECTED,
        )
        .unwrap();

        assert!(plan.overlay.is_none());
        assert!(plan.clear_local);
        assert_eq!(plan.grants, vec![Ace::grant("alice", AccessLevel::Read)]);
    }

    #[test]
    fn test_revoke_removes_overlay_and_grants_nothing() {
        let prior = RightsOverlay::parse(r#"{"alice":"take","bob":"take"}"#).unwrap();
        let plan = PermissionPlan::build(
            &[Ace::grant("alice", AccessLevel::Read)],
            &prior,
            &changes(&[("alice", EffectivePermission::None)]),
            PROTECTED,
        )
        .unwrap();

        assert!(plan.grants.is_empty());
        assert!(plan.clear_local);
        let overlay = plan.overlay.unwrap();
        assert!(!overlay.contains("alice"));
        assert!(overlay.grants_take("bob"));
    }

    #[test]
    fn test_one_overlay_rewrite_for_many_identities() {
        let plan = PermissionPlan::build(
            &[],
            &RightsOverlay::new(),
            &changes(&[
                ("alice", EffectivePermission::Take),
                ("bob", EffectivePermission::Take),
                ("carol", EffectivePermission::Edit),
            ]),
            PROTECTED,
        )
        .unwrap();

        let overlay = plan.overlay.unwrap();
        assert_eq!(overlay.len(), 2);
        assert_eq!(plan.grants.len(), 3);
    }

    #[test]
    fn test_protected_principal_rejected() {
        let result = PermissionPlan::build(
            &[],
            &RightsOverlay::new(),
            &changes(&[("administrators", EffectivePermission::View)]),
            PROTECTED,
        );
        assert!(matches!(result, Err(PermsError::ProtectedPrincipal(_))));
    }

    #[test]
    fn test_protected_names_compared_verbatim() {
        let local = [
            Ace::grant("Administrator", AccessLevel::Everything),
            Ace::grant("bob", AccessLevel::Read),
        ];
        let plan = PermissionPlan::build(
            &local,
            &RightsOverlay::new(),
            &changes(&[("administrator", EffectivePermission::Edit)]),
            PROTECTED,
        )
        .unwrap();
        assert_eq!(plan.grants, vec![Ace::grant("administrator", AccessLevel::ReadWrite)]);
        assert!(!plan.clear_local);
        assert!(plan.replaced.is_empty());

        let admin = IdentityNormalizer::default().admin();
        let mut exact = BTreeMap::new();
        exact.insert(admin, PermissionChange::to(EffectivePermission::View));
        assert!(matches!(
            PermissionPlan::build(&local, &RightsOverlay::new(), &exact, PROTECTED),
            Err(PermsError::ProtectedPrincipal(name)) if name == "Administrator"
        ));
    }

    #[test]
    fn test_revoke_of_unknown_identity_is_noop() {
        let plan = PermissionPlan::build(
            &[Ace::grant("bob", AccessLevel::Read)],
            &RightsOverlay::new(),
            &changes(&[("alice", EffectivePermission::None)]),
            PROTECTED,
        )
        .unwrap();
        assert!(plan.is_noop());
    }

    /// Carry out `plan` against an in-memory local ACL.
    fn apply(local: &[Ace], prior: &RightsOverlay, plan: &PermissionPlan) -> (Acl, RightsOverlay) {
        let mut group = AclGroup::new(LOCAL_ACL);
        group.entries = if plan.clear_local {
            plan.restore.clone()
        } else {
            local.to_vec()
        };
        group.entries.extend(plan.grants.iter().cloned());

        let mut acl = Acl::new();
        acl.groups.push(group);
        let overlay = plan.overlay.clone().unwrap_or_else(|| prior.clone());
        (acl, overlay)
    }

    fn permission() -> impl Strategy<Value = EffectivePermission> {
        prop_oneof![
            Just(EffectivePermission::None),
            Just(EffectivePermission::Take),
            Just(EffectivePermission::View),
            Just(EffectivePermission::Edit),
        ]
    }

    fn unrelated() -> impl Strategy<Value = Vec<Ace>> {
        let level = prop_oneof![
            Just(AccessLevel::Everything),
            Just(AccessLevel::ReadWrite),
            Just(AccessLevel::Read),
            Just(AccessLevel::ReadRemove),
        ];
        prop::collection::vec(
            ("ext-[a-z]{1,6}", level, any::<bool>()).prop_map(|(principal, level, granted)| Ace {
                principal,
                level,
                granted,
            }),
            0..5,
        )
    }

    proptest! {
        #[test]
        fn planned_state_resolves_to_target(
            prior in permission(),
            target in permission(),
            others in unrelated(),
        ) {
            let user = UserRecord {
                identity: id("alice"),
                groups: BTreeSet::from(["members".to_string()]),
            };

            let first = PermissionPlan::build(
                &others,
                &RightsOverlay::new(),
                &changes(&[("alice", prior)]),
                PROTECTED,
            )
            .unwrap();
            let (acl, overlay) = apply(&others, &RightsOverlay::new(), &first);

            let second = PermissionPlan::build(
                acl.local_entries(),
                &overlay,
                &changes(&[("alice", target)]),
                PROTECTED,
            )
            .unwrap();
            let (acl, overlay) = apply(acl.local_entries(), &overlay, &second);

            let resolved = AclVerdict::evaluate(&acl, &user)
                .resolve_with::<Infallible>("alice", || Ok(overlay.clone()))
                .unwrap();
            prop_assert_eq!(resolved, target);
            for ace in &others {
                prop_assert!(acl.local_entries().contains(ace));
            }
        }
    }
}
