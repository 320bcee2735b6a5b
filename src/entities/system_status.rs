//! Status entity - Tracks key placement progress per (host system, user).
//!
//! The table keeps the historical layout `status(id, status_cd, user_id)` where
//! `id` is the host system id. The composite primary key makes each pair unique.

use super::status_code::StatusCode;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "status")]
pub struct Model {
    /// Host system this status belongs to
    #[sea_orm(primary_key, auto_increment = false, column_name = "id")]
    pub host_system_id: i64,
    /// User whose key is being placed
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    /// Current placement status
    pub status_cd: StatusCode,
}

/// Defines relationships between Status and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each status row belongs to one host system
    #[sea_orm(
        belongs_to = "super::host_system::Entity",
        from = "Column::HostSystemId",
        to = "super::host_system::Column::Id",
        on_delete = "Cascade"
    )]
    HostSystem,
}

impl Related<super::host_system::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HostSystem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
