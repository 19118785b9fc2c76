//! # Vellum Testkit
//!
//! Testing utilities for Vellum.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: an in-memory repository with an administrator, a few
//!   users and groups, a course folder and its rights-bearing document
//! - **Decision vectors**: the 16 prior x desired permission transitions and
//!   the state each one must leave behind
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! ```rust
//! use vellum_testkit::fixtures::{TestFixture, FOLDER};
//!
//! let fixture = TestFixture::new();
//! assert_eq!(fixture.folder.path, FOLDER);
//! assert!(fixture.local_level("alice").is_none());
//! ```
//!
//! ## Decision Vectors
//!
//! ```rust
//! use vellum_testkit::vectors::decision_table;
//!
//! assert_eq!(decision_table().len(), 16);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use vellum_testkit::generators::{effective_permission, unrelated_principal};
//!
//! proptest! {
//!     #[test]
//!     fn unrelated_entries_survive(p in unrelated_principal(), target in effective_permission()) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::TestFixture;
pub use vectors::{decision_table, DecisionCase};
