//! Core logic - status store, batch initializer and their collaborator seams.

/// Permission scoping for batch starts
pub mod auth;
/// Batch initializer: reset and seed a user's statuses
pub mod batch;
/// Host catalog lookup used to decorate status reads
pub mod catalog;
/// Status store: per-user key placement progress
pub mod status;

pub use auth::{GrantTablePermissions, PermissionCheck, UserRole};
pub use batch::{BatchInitializer, BatchOutcome};
pub use catalog::{DbHostCatalog, HostCatalog};
pub use status::{HostStatus, StatusSummary};
