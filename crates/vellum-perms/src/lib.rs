//! # Vellum Permissions
//!
//! Pure permission logic over the repository's ACL and the application's
//! rights overlay.
//!
//! ## Overview
//!
//! The repository ACL only knows a handful of levels (Everything, ReadWrite,
//! Read, ReadRemove). The application needs one more: "take", which lets a
//! user run a document without viewing or editing it. That level lives in a
//! JSON overlay attribute on the document and only refines a Read grant.
//!
//! Nothing in this crate performs I/O. Callers fetch the ACL and overlay,
//! hand them here, and execute whatever plan comes back.
//!
//! ## Key Concepts
//!
//! - **AclVerdict**: what the ACL alone says about a user (Edit / View categories)
//! - **RightsOverlay**: the parsed JSON overlay
//! - **PermissionPlan**: the clear / restore / grant / overlay steps for a change set
//! - **PermissionMap**: every principal's highest application permission
//! - **AclRepresentation**: how one application permission is stored

pub mod error;
pub mod evaluate;
pub mod overlay;
pub mod plan;
pub mod translate;

pub use error::{PermsError, Result};
pub use evaluate::AclVerdict;
pub use overlay::RightsOverlay;
pub use plan::PermissionPlan;
pub use translate::{AclRepresentation, PermissionMap, ALL_USERS};
