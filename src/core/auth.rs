//! Authorization scoping for batch starts.
//!
//! Managers may act on any host system. Everyone else is narrowed to the hosts
//! granted to them before a batch is seeded.

use crate::{
    entities::{HostGrant, host_grant},
    errors::Result,
};
use sea_orm::{QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};

/// Role of the user starting a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Elevated role, bypasses the permission check
    Manager,
    /// Regular administrator, limited to granted hosts
    Administrator,
}

impl UserRole {
    /// Whether the permission check is skipped for this role.
    #[must_use]
    pub const fn is_manager(self) -> bool {
        matches!(self, Self::Manager)
    }
}

/// Narrows a candidate host set to the hosts a user may act on.
///
/// Implementations must not write to the status table.
#[allow(async_fn_in_trait)]
pub trait PermissionCheck {
    /// Returns the subset of `host_system_ids` that `user_id` is authorized for.
    async fn filter_authorized<C>(
        &self,
        db: &C,
        host_system_ids: &[i64],
        user_id: i64,
    ) -> Result<Vec<i64>>
    where
        C: ConnectionTrait;
}

/// Permission check backed by the `host_grant` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantTablePermissions;

impl PermissionCheck for GrantTablePermissions {
    async fn filter_authorized<C>(
        &self,
        db: &C,
        host_system_ids: &[i64],
        user_id: i64,
    ) -> Result<Vec<i64>>
    where
        C: ConnectionTrait,
    {
        if host_system_ids.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = host_system_ids.iter().copied();
        let grants = HostGrant::find()
            .filter(host_grant::Column::UserId.eq(user_id))
            .filter(host_grant::Column::HostSystemId.is_in(candidates))
            .order_by_asc(host_grant::Column::HostSystemId)
            .all(db)
            .await?;

        Ok(grants.into_iter().map(|g| g.host_system_id).collect())
    }
}
