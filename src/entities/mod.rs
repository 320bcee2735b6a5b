//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod host_grant;
pub mod host_system;
pub mod status_code;
pub mod system_status;

// Re-export specific types to avoid conflicts
pub use host_grant::{Column as HostGrantColumn, Entity as HostGrant, Model as HostGrantModel};
pub use host_system::{Column as HostSystemColumn, Entity as HostSystem, Model as HostSystemModel};
pub use status_code::StatusCode;
pub use system_status::{
    Column as SystemStatusColumn, Entity as SystemStatus, Model as SystemStatusModel,
};
