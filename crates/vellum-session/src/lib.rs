//! # Vellum Session
//!
//! Session management for Vellum.
//!
//! ## Overview
//!
//! Every remote call runs on a session authenticated as one identity.
//! [`SessionCache`] keeps one such session per identity, opening it on first
//! use and closing it once it has sat idle past a timeout. Creation races
//! are settled locally: concurrent callers for the same identity all receive
//! the one session that made it into the map.
//!
//! ## Key Types
//!
//! - [`SessionCache`] - identity to session map with idle eviction
//! - [`SessionStats`] - created / closed / active / uses counters
//! - [`IdentityCache`] - memoized per-identity lookups (user records)
//! - [`Sweeper`] - the periodic background thread that drives eviction

pub mod cache;
pub mod error;
pub mod identity_cache;
pub mod sweeper;

pub use cache::{SessionCache, SessionStats};
pub use error::{Result, SessionError};
pub use identity_cache::IdentityCache;
pub use sweeper::Sweeper;
