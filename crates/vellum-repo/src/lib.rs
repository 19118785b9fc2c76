//! # Vellum Repository
//!
//! The seams between Vellum and the remote document repository.
//!
//! ## Overview
//!
//! The permission and session layers never talk to the transport directly.
//! They go through three traits: a [`Connector`] that authenticates as an
//! identity, the [`RemoteSession`] it hands back, and the user [`Directory`].
//! [`MemoryRepository`] implements all of them for tests.
//!
//! ## Key Types
//!
//! - [`Connector`] / [`RemoteSession`] - authenticated document operations
//! - [`Directory`] - user records and group memberships
//! - [`RepoError`] - what the collaborators report
//! - [`classify_remote_error`] - the pattern rules that recognize lock
//!   conflicts and missing write privileges in remote messages
//! - [`MemoryRepository`] - in-memory repository with fault injection

pub mod classify;
pub mod error;
pub mod memory;
pub mod traits;

pub use classify::{classify_remote_error, RemoteErrorKind};
pub use error::{RepoError, Result};
pub use memory::{MemoryRepository, MemorySession, Operation, RepositoryStats, INHERITED_ACL};
pub use traits::{Connector, Directory, RemoteSession, Timeouts, DEFAULT_TIMEOUT};
