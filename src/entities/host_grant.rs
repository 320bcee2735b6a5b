//! Host grant entity - Which host systems a non-manager user may act on.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Host grant database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "host_grant")]
pub struct Model {
    /// User holding the grant
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    /// Host system granted to the user
    #[sea_orm(primary_key, auto_increment = false)]
    pub host_system_id: i64,
}

/// Defines relationships between `HostGrant` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each grant refers to one host system
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
