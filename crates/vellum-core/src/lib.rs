//! # Vellum Core
//!
//! Pure vocabulary for the Vellum repository client: identities, access
//! control lists, documents, and application permissions.
//!
//! This crate performs no I/O. Every other crate
//! in the workspace speaks in these types.
//!
//! ## Key Types
//!
//! - [`Identity`] - A normalized principal name (user or group)
//! - [`IdentityNormalizer`] - Canonicalizes raw identity strings
//! - [`Acl`] / [`AclGroup`] / [`Ace`] - The repository-native access model
//! - [`EffectivePermission`] - The application's permission vocabulary
//! - [`PermissionChange`] - A desired per-identity permission target
//! - [`Document`] - A repository document as seen by this layer

pub mod acl;
pub mod document;
pub mod error;
pub mod identity;
pub mod permission;
pub mod types;

pub use acl::{AccessLevel, Ace, Acl, AclGroup, LOCAL_ACL};
pub use document::{Document, UserRecord, MODIFIED_PROPERTY, RIGHTS_PROPERTY};
pub use error::{CoreError, Result};
pub use identity::{Identity, IdentityNormalizer, DEFAULT_ADMIN_IDENTITY};
pub use permission::{EffectivePermission, PermissionChange, TAKE_OVERLAY_VALUE};
pub use types::{DocumentId, SessionId};
