//! Host system entity - Remote machines that receive public keys.
//!
//! This crate only reads these rows; the catalog that maintains them lives elsewhere.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Host system database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "host_system")]
pub struct Model {
    /// Unique identifier for the host system
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name shown to operators
    pub display_name: String,
    /// Remote account the key is placed for
    pub username: String,
    /// Hostname or address
    pub host: String,
    /// SSH port
    pub port: i32,
    /// Path of the remote `authorized_keys` file
    pub authorized_keys: String,
}

/// Defines relationships between `HostSystem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One host system has many status rows (one per user)
    #[sea_orm(has_many = "super::system_status::Entity")]
    Statuses,
    /// One host system is granted to many users
    #[sea_orm(has_many = "super::host_grant::Entity")]
    Grants,
}

impl Related<super::system_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Statuses.def()
    }
}

impl Related<super::host_grant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
