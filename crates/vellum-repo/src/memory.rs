//! In-memory implementation of the repository collaborators.
//!
//! This is primarily for testing. It models the parts of the remote
//! repository this layer depends on: folder inheritance of ACLs, local ACL
//! clearing, string properties, advisory locks, write-privilege checks that
//! fail with the repository's own message text, and a user directory.
//! Faults can be injected per operation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use vellum_core::{
    Ace, Acl, AclGroup, Document, DocumentId, Identity, IdentityNormalizer, SessionId, UserRecord,
};

use crate::error::{RepoError, Result};
use crate::traits::{Connector, Directory, RemoteSession, Timeouts};

/// Name of the ACL group holding entries inherited from ancestors.
pub const INHERITED_ACL: &str = "inherited";

/// Operations a fault can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    OpenSession,
    FetchDocument,
    FetchAcl,
    SetAce,
    RemoveLocalAcl,
    SetProperty,
    Lock,
    Unlock,
    FetchUser,
}

/// Counters describing how the repository has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepositoryStats {
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub full_property_fetches: u64,
    pub acl_writes: u64,
    pub property_writes: u64,
    pub user_fetches: u64,
}

impl RepositoryStats {
    /// Sessions opened and not yet closed.
    pub fn open_sessions(&self) -> u64 {
        self.sessions_opened.saturating_sub(self.sessions_closed)
    }
}

#[derive(Default)]
struct Counters {
    sessions_opened: AtomicU64,
    sessions_closed: AtomicU64,
    full_property_fetches: AtomicU64,
    acl_writes: AtomicU64,
    property_writes: AtomicU64,
    user_fetches: AtomicU64,
}

struct StoredDocument {
    document: Document,
    parent: Option<DocumentId>,
    local: Vec<Ace>,
}

#[derive(Default)]
struct State {
    documents: BTreeMap<DocumentId, StoredDocument>,
    paths: BTreeMap<String, DocumentId>,
    users: BTreeMap<Identity, UserRecord>,
    root_acl: Vec<Ace>,
    next_id: u64,
}

impl State {
    fn stored(&self, id: &DocumentId) -> Result<&StoredDocument> {
        self.documents
            .get(id)
            .ok_or_else(|| RepoError::NotFound(format!("document {id}")))
    }

    fn stored_mut(&mut self, id: &DocumentId) -> Result<&mut StoredDocument> {
        self.documents
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(format!("document {id}")))
    }

    fn by_path(&self, path: &str) -> Result<&StoredDocument> {
        let id = self
            .paths
            .get(path)
            .ok_or_else(|| RepoError::NotFound(format!("document at {path}")))?;
        self.stored(id)
    }

    fn acl(&self, id: &DocumentId) -> Result<Acl> {
        let stored = self.stored(id)?;

        let mut local = AclGroup::new(vellum_core::LOCAL_ACL);
        local.entries = stored.local.clone();

        let mut inherited = AclGroup::new(INHERITED_ACL);
        let mut parent = stored.parent.clone();
        while let Some(parent_id) = parent {
            let ancestor = self.stored(&parent_id)?;
            inherited.entries.extend(ancestor.local.iter().cloned());
            parent = ancestor.parent.clone();
        }
        inherited.entries.extend(self.root_acl.iter().cloned());

        let mut acl = Acl::new();
        acl.groups.push(local);
        if !inherited.entries.is_empty() {
            acl.groups.push(inherited);
        }
        Ok(acl)
    }

    fn can_write(&self, identity: &Identity, id: &DocumentId) -> Result<bool> {
        let acl = self.acl(id)?;
        let user = self.users.get(identity);
        let allowed = acl.granted_entries().any(|ace| {
            ace.level.grants_edit()
                && match user {
                    Some(user) => user.is_named_by(&ace.principal),
                    None => identity.as_str() == ace.principal,
                }
        });
        Ok(allowed)
    }
}

struct Shared {
    state: RwLock<State>,
    faults: Mutex<HashMap<Operation, RepoError>>,
    open_delay: Mutex<Duration>,
    counters: Counters,
    normalizer: IdentityNormalizer,
}

impl Shared {
    fn check_fault(&self, op: Operation) -> Result<()> {
        match self.faults.lock().get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// An in-memory repository and user directory.
///
/// Cloning is cheap and every clone shares the same state, so one handle
/// can serve as both [`Connector`] and [`Directory`] while a test keeps
/// another to inspect the result.
#[derive(Clone)]
pub struct MemoryRepository {
    shared: Arc<Shared>,
}

impl MemoryRepository {
    /// Create an empty repository using the default administrator identity.
    pub fn new() -> Self {
        Self::with_normalizer(IdentityNormalizer::default())
    }

    /// Create an empty repository that normalizes fixture names with
    /// `normalizer`.
    pub fn with_normalizer(normalizer: IdentityNormalizer) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(State::default()),
                faults: Mutex::new(HashMap::new()),
                open_delay: Mutex::new(Duration::ZERO),
                counters: Counters::default(),
                normalizer,
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fixture setup
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a user and its group memberships.
    pub fn add_user(&self, name: &str, groups: &[&str]) -> Result<Identity> {
        let identity = self
            .shared
            .normalizer
            .normalize(name)
            .map_err(|e| RepoError::remote(e.to_string()))?;
        let record = UserRecord {
            identity: identity.clone(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
        };
        self.shared
            .state
            .write()
            .users
            .insert(identity.clone(), record);
        Ok(identity)
    }

    /// Add an entry inherited by every document.
    pub fn add_root_ace(&self, ace: Ace) {
        self.shared.state.write().root_acl.push(ace);
    }

    /// Create a document at `path`.
    ///
    /// The nearest existing ancestor folder becomes its parent for ACL
    /// inheritance. Creating an existing path returns the existing document.
    pub fn add_document(&self, path: &str) -> Document {
        let mut state = self.shared.state.write();

        if let Some(id) = state.paths.get(path) {
            if let Some(stored) = state.documents.get(id) {
                return stored.document.clone();
            }
        }

        state.next_id += 1;
        let id = DocumentId::new(format!("doc-{:04}", state.next_id));

        let mut parent = None;
        let mut prefix = path;
        while let Some(idx) = prefix.rfind('/') {
            prefix = &prefix[..idx];
            if let Some(parent_id) = state.paths.get(prefix) {
                parent = Some(parent_id.clone());
                break;
            }
        }

        let document = Document::new(id.as_str(), path);
        state.paths.insert(path.to_string(), id.clone());
        state.documents.insert(
            id,
            StoredDocument {
                document: document.clone(),
                parent,
                local: Vec::new(),
            },
        );
        document
    }

    /// Replace a document's local ACL.
    pub fn set_local_acl(&self, path: &str, entries: Vec<Ace>) -> Result<()> {
        let mut state = self.shared.state.write();
        let id = state.by_path(path)?.document.id.clone();
        state.stored_mut(&id)?.local = entries;
        Ok(())
    }

    /// Set a property directly, bypassing privilege checks.
    pub fn put_property(&self, path: &str, name: &str, value: &str) -> Result<()> {
        let mut state = self.shared.state.write();
        let id = state.by_path(path)?.document.id.clone();
        state
            .stored_mut(&id)?
            .document
            .properties
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    /// A document with all of its properties.
    pub fn document(&self, path: &str) -> Result<Document> {
        Ok(self.shared.state.read().by_path(path)?.document.clone())
    }

    /// A document's full ACL.
    pub fn acl(&self, path: &str) -> Result<Acl> {
        let state = self.shared.state.read();
        let id = state.by_path(path)?.document.id.clone();
        state.acl(&id)
    }

    /// A document's local ACL entries.
    pub fn local_acl(&self, path: &str) -> Result<Vec<Ace>> {
        Ok(self.shared.state.read().by_path(path)?.local.clone())
    }

    /// A single property value.
    pub fn property(&self, path: &str, name: &str) -> Result<Option<String>> {
        Ok(self
            .shared
            .state
            .read()
            .by_path(path)?
            .document
            .properties
            .get(name)
            .cloned())
    }

    /// Usage counters.
    pub fn stats(&self) -> RepositoryStats {
        let c = &self.shared.counters;
        RepositoryStats {
            sessions_opened: c.sessions_opened.load(Ordering::SeqCst),
            sessions_closed: c.sessions_closed.load(Ordering::SeqCst),
            full_property_fetches: c.full_property_fetches.load(Ordering::SeqCst),
            acl_writes: c.acl_writes.load(Ordering::SeqCst),
            property_writes: c.property_writes.load(Ordering::SeqCst),
            user_fetches: c.user_fetches.load(Ordering::SeqCst),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fault injection
    // ─────────────────────────────────────────────────────────────────────────

    /// Make every call of `op` fail with `err` until cleared.
    pub fn inject_fault(&self, op: Operation, err: RepoError) {
        self.shared.faults.lock().insert(op, err);
    }

    /// Remove the fault for `op`.
    pub fn clear_fault(&self, op: Operation) {
        self.shared.faults.lock().remove(&op);
    }

    /// Delay every session handshake by `delay`.
    pub fn set_open_delay(&self, delay: Duration) {
        *self.shared.open_delay.lock() = delay;
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for MemoryRepository {
    type Session = MemorySession;

    fn open_session(&self, identity: &Identity, _timeouts: &Timeouts) -> Result<MemorySession> {
        self.shared.check_fault(Operation::OpenSession)?;

        let delay = *self.shared.open_delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let id = SessionId::from_bytes(rand::random());
        self.shared
            .counters
            .sessions_opened
            .fetch_add(1, Ordering::SeqCst);
        debug!(session = %id, identity = %identity, "opened in-memory session");

        Ok(MemorySession {
            id,
            identity: identity.clone(),
            shared: Arc::clone(&self.shared),
            closed: AtomicBool::new(false),
        })
    }
}

impl Directory for MemoryRepository {
    fn fetch_user(&self, identity: &Identity) -> Result<Option<UserRecord>> {
        self.shared.check_fault(Operation::FetchUser)?;
        self.shared
            .counters
            .user_fetches
            .fetch_add(1, Ordering::SeqCst);
        Ok(self.shared.state.read().users.get(identity).cloned())
    }
}

/// A session on a [`MemoryRepository`].
pub struct MemorySession {
    id: SessionId,
    identity: Identity,
    shared: Arc<Shared>,
    closed: AtomicBool,
}

impl MemorySession {
    /// Whether [`close`](RemoteSession::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn denied(&self, operation: &str) -> RepoError {
        RepoError::Remote {
            status: Some(403),
            message: format!(
                "Failed to invoke operation: {operation}, Privilege 'WriteProperties' is not granted to {}",
                self.identity
            ),
        }
    }

    fn require_write(&self, state: &State, id: &DocumentId, operation: &str) -> Result<()> {
        if state.can_write(&self.identity, id)? {
            Ok(())
        } else {
            Err(self.denied(operation))
        }
    }
}

impl RemoteSession for MemorySession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn fetch_document(&self, path: &str, full_properties: bool) -> Result<Document> {
        self.shared.check_fault(Operation::FetchDocument)?;
        let state = self.shared.state.read();
        let mut document = state.by_path(path)?.document.clone();
        if full_properties {
            self.shared
                .counters
                .full_property_fetches
                .fetch_add(1, Ordering::SeqCst);
        } else {
            document.properties.clear();
        }
        Ok(document)
    }

    fn fetch_acl(&self, id: &DocumentId) -> Result<Acl> {
        self.shared.check_fault(Operation::FetchAcl)?;
        self.shared.state.read().acl(id)
    }

    fn set_ace(&self, id: &DocumentId, ace: &Ace, overwrite: bool) -> Result<()> {
        self.shared.check_fault(Operation::SetAce)?;
        let mut state = self.shared.state.write();
        self.require_write(&state, id, "Document.SetACE")?;

        let stored = state.stored_mut(id)?;
        if overwrite {
            stored
                .local
                .retain(|e| !(e.principal == ace.principal && e.level == ace.level));
        }
        stored.local.push(ace.clone());
        self.shared.counters.acl_writes.fetch_add(1, Ordering::SeqCst);
        trace!(document = %id, principal = %ace.principal, level = %ace.level, "set ace");
        Ok(())
    }

    fn remove_local_acl(&self, id: &DocumentId) -> Result<()> {
        self.shared.check_fault(Operation::RemoveLocalAcl)?;
        let mut state = self.shared.state.write();
        self.require_write(&state, id, "Document.RemoveACL")?;

        state.stored_mut(id)?.local.clear();
        self.shared.counters.acl_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_property(&self, id: &DocumentId, name: &str, value: &str) -> Result<()> {
        self.shared.check_fault(Operation::SetProperty)?;
        let mut state = self.shared.state.write();
        self.require_write(&state, id, "Document.SetProperty")?;

        state
            .stored_mut(id)?
            .document
            .properties
            .insert(name.to_string(), value.to_string());
        self.shared
            .counters
            .property_writes
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn lock(&self, document: &Document) -> Result<Document> {
        self.shared.check_fault(Operation::Lock)?;
        let mut state = self.shared.state.write();
        self.require_write(&state, &document.id, "Document.Lock")?;

        let stored = state.stored_mut(&document.id)?;
        if let Some(owner) = stored
            .document
            .lock_owner
            .as_deref()
            .filter(|owner| *owner != self.identity.as_str())
        {
            return Err(RepoError::Remote {
                status: Some(409),
                message: format!(
                    "Failed to invoke operation: Document.Lock, Document already locked by {owner}: {}",
                    document.id
                ),
            });
        }
        stored.document.lock_owner = Some(self.identity.to_string());
        Ok(stored.document.clone())
    }

    fn unlock(&self, document: &Document) -> Result<Document> {
        self.shared.check_fault(Operation::Unlock)?;
        let mut state = self.shared.state.write();

        let stored = state.stored_mut(&document.id)?;
        // Another identity's lock is left in place.
        if stored.document.lock_owner.as_deref() == Some(self.identity.as_str()) {
            stored.document.lock_owner = None;
        }
        Ok(stored.document.clone())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.shared
                .counters
                .sessions_closed
                .fetch_add(1, Ordering::SeqCst);
            debug!(session = %self.id, identity = %self.identity, "closed in-memory session");
        }
    }
}
