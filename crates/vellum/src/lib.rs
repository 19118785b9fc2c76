//! # Vellum
//!
//! Per-user sessions, effective permissions, and advisory locks over a
//! remote, multi-tenant document repository.
//!
//! ## Overview
//!
//! The repository enforces its own ACL, but the application needs one
//! permission the ACL can't express ("take": run a document without viewing
//! or editing it). Vellum reconciles the repository ACL with the
//! application's rights overlay into one answer per user, applies permission
//! changes to both, and keeps one authenticated session per user so every
//! call runs as that user.
//!
//! ## Key Concepts
//!
//! - **Identity**: lower-cased principal name, except the administrator
//! - **Effective permission**: `Edit` > `Take` > `View` > `None`
//! - **Local ACL**: the entries set directly on a document; the only ones
//!   Vellum rewrites
//! - **Rights overlay**: JSON attribute marking "take" on top of Read
//!
//! ## Usage
//!
//! ```rust
//! use vellum::{Client, ClientConfig, EffectivePermission};
//! use vellum::repo::MemoryRepository;
//! use vellum::core::{AccessLevel, Ace};
//!
//! let repo = MemoryRepository::new();
//! repo.add_user("Administrator", &["administrators"]).unwrap();
//! repo.add_user("alice", &[]).unwrap();
//! repo.add_root_ace(Ace::grant("administrators", AccessLevel::Everything));
//! let course = repo.add_document("/course");
//!
//! let client = Client::new(repo.clone(), repo, ClientConfig::default()).unwrap();
//! client
//!     .apply_permissions(&course, &course, [("alice", EffectivePermission::Take)])
//!     .unwrap();
//! assert_eq!(
//!     client.effective_permission("alice", &course).unwrap(),
//!     EffectivePermission::Take
//! );
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `vellum::core` - identities, ACLs, documents, permissions
//! - `vellum::perms` - evaluation, planning, translation
//! - `vellum::repo` - collaborator traits and the in-memory repository
//! - `vellum::session` - session cache and sweeper

pub mod client;
pub mod config;
pub mod error;
pub mod lock;
pub mod resolver;

// Re-export component crates
pub use vellum_core as core;
pub use vellum_perms as perms;
pub use vellum_repo as repo;
pub use vellum_session as session;

// Re-export main types for convenience
pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use resolver::{ApplyPhase, ApplyReport};

// Re-export commonly used types
pub use vellum_core::{Document, EffectivePermission, Identity, PermissionChange};
pub use vellum_perms::PermissionMap;
pub use vellum_session::SessionStats;
