//! Permission resolution: effective permissions, listings, and changes.
//!
//! All reads and writes here run on the administrator's session, since
//! ordinary identities can't read other principals' entries or the rights
//! overlay.
//!
//! # Applying changes
//!
//! [`Client::apply_permissions`] executes a [`PermissionPlan`] in three
//! phases: clear the folder's local ACL (only when an identity being changed
//! already has a local entry), re-apply every preserved entry, then add the
//! new entries. The overlay is rewritten once at the end. None of this is
//! atomic on the repository side: a concurrent reader can briefly see the
//! preserved entries without the new ones. A failure part way through is
//! not resumable; callers retry the whole call.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use vellum_core::{
    AccessLevel, Document, EffectivePermission, Identity, PermissionChange, MODIFIED_PROPERTY,
    RIGHTS_PROPERTY,
};
use vellum_perms::{AclVerdict, PermissionMap, PermissionPlan, RightsOverlay};
use vellum_repo::{Connector, Directory, RemoteSession, RepoError};

use crate::client::Client;
use crate::error::{ClientError, Result};

/// What [`Client::apply_permissions`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyReport {
    /// The folder's local ACL was cleared and rebuilt.
    pub cleared_local: bool,
    /// Preserved entries re-applied after the clear.
    pub restored: usize,
    /// New entries added.
    pub granted: usize,
    /// The rights overlay was rewritten.
    pub overlay_written: bool,
}

/// Progress through the remote steps of a permission change.
///
/// `done` counts steps finished so far out of `total` for the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyPhase {
    /// About to clear the folder's local ACL.
    ClearingLocal,
    /// Re-applying preserved entries.
    Restoring { done: usize, total: usize },
    /// Adding new entries.
    Granting { done: usize, total: usize },
    /// About to rewrite the rights overlay.
    WritingOverlay,
}

impl<C: Connector, D: Directory> Client<C, D> {
    /// The highest permission `identity` holds on `document`.
    ///
    /// Entries naming any of the identity's groups count like entries naming
    /// it directly. The rights overlay is only fetched when the ACL grants
    /// plain Read, since that is the only case where it can change the
    /// answer. No access at all is `Ok(None)`, not an error.
    pub fn effective_permission(
        &self,
        identity: &str,
        document: &Document,
    ) -> Result<EffectivePermission> {
        document.validate()?;
        let identity = self.normalize(identity)?;
        let user = self.require_user(&identity)?;

        let session = self.admin_session()?;
        let acl = session.fetch_acl(&document.id)?;
        let verdict = AclVerdict::evaluate(&acl, &user);

        let permission = verdict.resolve_with(identity.as_str(), || {
            read_overlay(&*session, &document.path)
        })?;

        debug!(
            identity = %identity,
            path = %document.path,
            permission = %permission,
            overlay_read = verdict.needs_overlay(),
            "resolved effective permission"
        );
        Ok(permission)
    }

    /// Whether `identity` can edit `document`, from the ACL alone.
    ///
    /// An identity the directory doesn't know has no access.
    pub fn has_write_permission(&self, identity: &str, document: &Document) -> Result<bool> {
        Ok(self.verdict(identity, document)?.edit)
    }

    /// Whether `identity` can view `document`, from the ACL alone.
    pub fn has_read_permission(&self, identity: &str, document: &Document) -> Result<bool> {
        Ok(self.verdict(identity, document)?.view)
    }

    fn verdict(&self, identity: &str, document: &Document) -> Result<AclVerdict> {
        document.validate()?;
        let identity = self.normalize(identity)?;
        let Some(user) = self.user(&identity)? else {
            return Ok(AclVerdict::default());
        };

        let acl = self.admin_session()?.fetch_acl(&document.id)?;
        Ok(AclVerdict::evaluate(&acl, &user))
    }

    /// Every principal's highest permission on `document`.
    ///
    /// The everyone group is reported as [`ALL_USERS`](vellum_perms::ALL_USERS).
    pub fn permissions(&self, document: &Document) -> Result<PermissionMap> {
        document.validate()?;
        let session = self.admin_session()?;
        let acl = session.fetch_acl(&document.id)?;

        let has_read = acl
            .granted_entries()
            .any(|ace| ace.level == AccessLevel::Read);
        let overlay = if has_read {
            read_overlay(&*session, &document.path)?
        } else {
            RightsOverlay::new()
        };

        Ok(PermissionMap::from_acl(
            &acl,
            &overlay,
            &self.inner.config.everyone_group,
        ))
    }

    /// Change the permissions of several identities at once.
    ///
    /// ACL entries are rewritten on `folder`; the rights overlay lives on
    /// `rights_document` (which may be the same document). Each change sets
    /// the identity's permission to exactly its target, or removes it.
    /// Identities are normalized first, and when two raw identities
    /// normalize to the same one the later change wins. Naming the
    /// administrator identity or the administrators group is rejected.
    pub fn apply_permissions<I, K, V>(
        &self,
        folder: &Document,
        rights_document: &Document,
        changes: I,
    ) -> Result<ApplyReport>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<PermissionChange>,
    {
        self.apply_permissions_with_progress(folder, rights_document, changes, |_| {})
    }

    /// [`apply_permissions`](Self::apply_permissions), reporting each remote
    /// step to `progress` before it runs. A no-op change reports nothing.
    pub fn apply_permissions_with_progress<I, K, V, F>(
        &self,
        folder: &Document,
        rights_document: &Document,
        changes: I,
        mut progress: F,
    ) -> Result<ApplyReport>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<PermissionChange>,
        F: FnMut(ApplyPhase),
    {
        folder.validate()?;
        rights_document.validate()?;

        let mut normalized: BTreeMap<Identity, PermissionChange> = BTreeMap::new();
        for (raw, change) in changes {
            normalized.insert(self.normalize(raw.as_ref())?, change.into());
        }
        if normalized.is_empty() {
            return Ok(ApplyReport::default());
        }

        let config = &self.inner.config;
        let admins = self.normalize(&config.administrators_group)?;
        let protected = [config.admin_identity.as_str(), admins.as_str()];

        let session = self.admin_session()?;
        let acl = session.fetch_acl(&folder.id)?;
        let overlay = read_overlay(&*session, &rights_document.path)?;
        let plan = PermissionPlan::build(acl.local_entries(), &overlay, &normalized, &protected)?;

        if plan.is_noop() {
            debug!(path = %folder.path, "permission change is a no-op");
            return Ok(ApplyReport::default());
        }

        let report = execute(&*session, folder, rights_document, &plan, &mut progress)
            .map_err(|e| update_error(&folder.path, e))?;

        info!(
            path = %folder.path,
            identities = normalized.len(),
            cleared = report.cleared_local,
            restored = report.restored,
            granted = report.granted,
            overlay = report.overlay_written,
            "applied permission changes"
        );

        if config.touch_modified_on_change {
            touch_modified(&*session, folder);
        }

        Ok(report)
    }
}

fn execute<S: RemoteSession>(
    session: &S,
    folder: &Document,
    rights_document: &Document,
    plan: &PermissionPlan,
    progress: &mut impl FnMut(ApplyPhase),
) -> std::result::Result<ApplyReport, RepoError> {
    let mut report = ApplyReport::default();

    if plan.clear_local {
        debug!(path = %folder.path, replaced = plan.replaced.len(), "clearing local ACL");
        progress(ApplyPhase::ClearingLocal);
        session.remove_local_acl(&folder.id)?;
        report.cleared_local = true;

        let total = plan.restore.len();
        for ace in &plan.restore {
            progress(ApplyPhase::Restoring {
                done: report.restored,
                total,
            });
            session.set_ace(&folder.id, ace, false)?;
            report.restored += 1;
        }
    }

    let total = plan.grants.len();
    for ace in &plan.grants {
        progress(ApplyPhase::Granting {
            done: report.granted,
            total,
        });
        session.set_ace(&folder.id, ace, true)?;
        report.granted += 1;
    }

    if let Some(overlay) = &plan.overlay {
        progress(ApplyPhase::WritingOverlay);
        session.set_property(&rights_document.id, RIGHTS_PROPERTY, &overlay.to_json())?;
        report.overlay_written = true;
    }

    Ok(report)
}

/// Wrap a failed ACL or overlay write, naming the folder.
///
/// Transport failures and quota errors keep their own kind so callers can
/// still tell them apart.
fn update_error(path: &str, err: RepoError) -> ClientError {
    match err {
        RepoError::Connection(_) | RepoError::Timeout(_) | RepoError::QuotaExceeded(_) => err.into(),
        source => ClientError::PermissionUpdate {
            path: path.to_string(),
            source,
        },
    }
}

/// Fetch a document's rights overlay. An unreadable overlay is empty.
fn read_overlay<S: RemoteSession>(session: &S, path: &str) -> Result<RightsOverlay> {
    let full = session.fetch_document(path, true)?;
    Ok(RightsOverlay::parse_lenient(
        full.property(RIGHTS_PROPERTY),
        path,
    ))
}

/// Best effort: a failure is logged and otherwise ignored.
fn touch_modified<S: RemoteSession>(session: &S, folder: &Document) {
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    if let Err(e) = session.set_property(&folder.id, MODIFIED_PROPERTY, &stamp) {
        warn!(path = %folder.path, error = %e, "failed to update modification time");
    }
}
