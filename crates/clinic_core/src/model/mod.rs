//! Domain model for tenants and their patient records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep field-level structural checks next to the data they guard.
//!
//! # Invariants
//! - Every patient is owned by exactly one tenant.
//! - Document uniqueness is tenant-scoped, never global.

pub mod patient;
pub mod tenant;
