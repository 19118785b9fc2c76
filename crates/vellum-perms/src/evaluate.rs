//! Effective-permission evaluation.
//!
//! Evaluation runs in two steps. The ACL is scanned first; the overlay is
//! only consulted when the ACL result is ambiguous between View and Take,
//! since reading it costs an extra full-property fetch.

use vellum_core::{Acl, EffectivePermission, UserRecord};

use crate::overlay::RightsOverlay;

/// What the ACL alone says about one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AclVerdict {
    /// A granted Everything/ReadWrite entry names the user or a group of theirs.
    pub edit: bool,
    /// A granted Everything/ReadWrite/Read entry names the user or a group of theirs.
    pub view: bool,
}

impl AclVerdict {
    /// Scan every granted entry of `acl` on behalf of `user`.
    pub fn evaluate(acl: &Acl, user: &UserRecord) -> Self {
        let mut verdict = AclVerdict::default();

        for ace in acl.granted_entries() {
            if !user.is_named_by(&ace.principal) {
                continue;
            }

            verdict.edit |= ace.level.grants_edit();
            verdict.view |= ace.level.grants_view();

            // Edit implies view and outranks everything else.
            if verdict.edit {
                break;
            }
        }

        verdict
    }

    /// Whether the overlay has to be read to settle View versus Take.
    ///
    /// True only when view access came from a plain `Read` entry.
    pub fn needs_overlay(&self) -> bool {
        self.view && !self.edit
    }

    /// Resolve the verdict, reading the overlay only if needed.
    pub fn resolve_with<E>(
        self,
        identity: &str,
        fetch_overlay: impl FnOnce() -> Result<RightsOverlay, E>,
    ) -> Result<EffectivePermission, E> {
        if self.edit {
            return Ok(EffectivePermission::Edit);
        }
        if !self.view {
            return Ok(EffectivePermission::None);
        }

        let overlay = fetch_overlay()?;
        if overlay.grants_take(identity) {
            Ok(EffectivePermission::Take)
        } else {
            Ok(EffectivePermission::View)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;
    use vellum_core::{AccessLevel, Ace, AclGroup, IdentityNormalizer, LOCAL_ACL};

    fn user(name: &str, groups: &[&str]) -> UserRecord {
        UserRecord {
            identity: IdentityNormalizer::default().normalize(name).unwrap(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn acl(entries: Vec<Ace>) -> Acl {
        let mut local = AclGroup::new(LOCAL_ACL);
        local.entries = entries;
        Acl {
            groups: vec![local],
        }
    }

    fn resolve(verdict: AclVerdict, overlay: &str) -> (EffectivePermission, bool) {
        let fetched = Cell::new(false);
        let result = verdict
            .resolve_with::<Infallible>("alice", || {
                fetched.set(true);
                Ok(RightsOverlay::parse(overlay).unwrap())
            })
            .unwrap();
        (result, fetched.get())
    }

    #[test]
    fn test_no_entries_is_none_without_overlay_fetch() {
        let verdict = AclVerdict::evaluate(&acl(vec![]), &user("alice", &[]));
        assert_eq!(resolve(verdict, r#"{"alice":"take"}"#), (EffectivePermission::None, false));
    }

    #[test]
    fn test_readwrite_is_edit_without_overlay_fetch() {
        let verdict = AclVerdict::evaluate(
            &acl(vec![Ace::grant("alice", AccessLevel::ReadWrite)]),
            &user("alice", &[]),
        );
        assert_eq!(resolve(verdict, r#"{"alice":"take"}"#), (EffectivePermission::Edit, false));
    }

    #[test]
    fn test_read_with_take_marker() {
        let verdict = AclVerdict::evaluate(
            &acl(vec![Ace::grant("alice", AccessLevel::Read)]),
            &user("alice", &[]),
        );
        assert!(verdict.needs_overlay());
        assert_eq!(resolve(verdict, r#"{"alice":"take"}"#), (EffectivePermission::Take, true));
        assert_eq!(resolve(verdict, r#"{"bob":"take"}"#), (EffectivePermission::View, true));
    }

    #[test]
    fn test_group_entry_counts_like_direct_entry() {
        let verdict = AclVerdict::evaluate(
            &acl(vec![Ace::grant("authors", AccessLevel::Everything)]),
            &user("alice", &["authors"]),
        );
        assert_eq!(verdict, AclVerdict { edit: true, view: true });
    }

    #[test]
    fn test_scans_past_weaker_entries() {
        let verdict = AclVerdict::evaluate(
            &acl(vec![
                Ace::grant("alice", AccessLevel::Read),
                Ace::grant("bob", AccessLevel::ReadWrite),
                Ace::grant("authors", AccessLevel::ReadWrite),
            ]),
            &user("alice", &["authors"]),
        );
        assert!(verdict.edit);
    }

    #[test]
    fn test_denied_and_readremove_entries_ignored() {
        let verdict = AclVerdict::evaluate(
            &acl(vec![
                Ace::deny("alice", AccessLevel::ReadWrite),
                Ace::grant("alice", AccessLevel::ReadRemove),
            ]),
            &user("alice", &[]),
        );
        assert_eq!(verdict, AclVerdict::default());
    }

    #[test]
    fn test_inherited_groups_are_scanned() {
        let mut inherited = AclGroup::new("inherited");
        inherited.entries.push(Ace::grant("members", AccessLevel::Read));
        let acl = Acl {
            groups: vec![AclGroup::new(LOCAL_ACL), inherited],
        };
        let verdict = AclVerdict::evaluate(&acl, &user("alice", &["members"]));
        assert!(verdict.view && !verdict.edit);
    }

    #[test]
    fn test_overlay_fetch_error_propagates() {
        let verdict = AclVerdict { edit: false, view: true };
        let result = verdict.resolve_with("alice", || Err("offline"));
        assert_eq!(result, Err("offline"));
    }
}
