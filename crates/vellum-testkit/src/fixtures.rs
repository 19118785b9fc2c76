//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use vellum_core::{AccessLevel, Ace, Document, Identity};
use vellum_perms::RightsOverlay;
use vellum_repo::MemoryRepository;

/// The administrator identity of the fixture repository.
pub const ADMIN: &str = "Administrator";

/// The administrators group.
pub const ADMINISTRATORS: &str = "administrators";

/// The group every regular user belongs to.
pub const EVERYONE: &str = "members";

/// The course folder whose ACL gets rewritten.
pub const FOLDER: &str = "/workspaces/course-101";

/// The document carrying the course's rights overlay.
pub const RIGHTS_DOCUMENT: &str = "/workspaces/course-101/course.xml";

/// An in-memory repository with a course folder and some users.
///
/// Users: `Administrator` (administrators), `alice`, `bob`, `carol`
/// (members), and `dave` (members, instructors). The folder's local ACL starts
/// with `Everything` for both the administrator and the administrators
/// group; the rights document inherits the folder's ACL.
pub struct TestFixture {
    pub repo: MemoryRepository,
    pub folder: Document,
    pub rights: Document,
}

impl TestFixture {
    /// Create a new fixture.
    pub fn new() -> Self {
        let repo = MemoryRepository::new();
        repo.add_root_ace(Ace::grant(ADMINISTRATORS, AccessLevel::Everything));

        for (name, groups) in [
            (ADMIN, &[ADMINISTRATORS][..]),
            ("alice", &[EVERYONE][..]),
            ("bob", &[EVERYONE][..]),
            ("carol", &[EVERYONE][..]),
            ("dave", &[EVERYONE, "instructors"][..]),
        ] {
            repo.add_user(name, groups).expect("fixture user");
        }

        repo.add_document("/workspaces");
        let folder = repo.add_document(FOLDER);
        let rights = repo.add_document(RIGHTS_DOCUMENT);
        repo.set_local_acl(
            FOLDER,
            vec![
                Ace::grant(ADMIN, AccessLevel::Everything),
                Ace::grant(ADMINISTRATORS, AccessLevel::Everything),
            ],
        )
        .expect("fixture folder ACL");

        Self {
            repo,
            folder,
            rights,
        }
    }

    /// Add another user.
    pub fn add_user(&self, name: &str, groups: &[&str]) -> Identity {
        self.repo.add_user(name, groups).expect("fixture user")
    }

    /// Add a document below the folder.
    pub fn add_document(&self, name: &str) -> Document {
        self.repo.add_document(&format!("{FOLDER}/{name}"))
    }

    /// Replace the folder's local entries.
    pub fn set_folder_entries(&self, entries: Vec<Ace>) {
        self.repo
            .set_local_acl(FOLDER, entries)
            .expect("folder ACL");
    }

    /// The folder's current local entries.
    pub fn local_entries(&self) -> Vec<Ace> {
        self.repo.local_acl(FOLDER).expect("folder ACL")
    }

    /// Levels of the granted local entries naming `principal`.
    pub fn local_levels(&self, principal: &str) -> Vec<AccessLevel> {
        self.local_entries()
            .into_iter()
            .filter(|ace| ace.granted && ace.principal == principal)
            .map(|ace| ace.level)
            .collect()
    }

    /// The single granted local level for `principal`, if any.
    ///
    /// Panics if the principal has more than one local entry.
    pub fn local_level(&self, principal: &str) -> Option<AccessLevel> {
        let levels = self.local_levels(principal);
        assert!(
            levels.len() <= 1,
            "{principal} has several local entries: {levels:?}"
        );
        levels.first().copied()
    }

    /// The rights document's current overlay.
    pub fn overlay(&self) -> RightsOverlay {
        let raw = self
            .repo
            .property(RIGHTS_DOCUMENT, vellum_core::RIGHTS_PROPERTY)
            .expect("rights document");
        RightsOverlay::parse_lenient(raw.as_deref(), RIGHTS_DOCUMENT)
    }

    /// Overwrite the rights document's overlay with raw text.
    pub fn put_raw_overlay(&self, raw: &str) {
        self.repo
            .put_property(RIGHTS_DOCUMENT, vellum_core::RIGHTS_PROPERTY, raw)
            .expect("rights document");
    }

    /// Fresh copies of the folder and rights document.
    pub fn refresh(&self) -> (Document, Document) {
        (
            self.repo.document(FOLDER).expect("folder"),
            self.repo.document(RIGHTS_DOCUMENT).expect("rights document"),
        )
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
