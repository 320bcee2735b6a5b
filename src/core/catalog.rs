//! Host catalog lookup.
//!
//! Every status read is decorated with its host system record. The catalog is
//! owned elsewhere; this crate only needs to resolve an id to a record, and an id
//! that has vanished from the catalog is `Ok(None)`, not an error.

use crate::{
    entities::{HostSystem, host_system},
    errors::Result,
};
use sea_orm::prelude::*;

/// Resolves host system ids to their catalog records.
#[allow(async_fn_in_trait)]
pub trait HostCatalog {
    /// Fetches one host system, `None` if the id is unknown.
    async fn fetch_host<C>(&self, db: &C, host_system_id: i64) -> Result<Option<host_system::Model>>
    where
        C: ConnectionTrait;
}

/// Catalog backed by the `host_system` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbHostCatalog;

impl HostCatalog for DbHostCatalog {
    async fn fetch_host<C>(&self, db: &C, host_system_id: i64) -> Result<Option<host_system::Model>>
    where
        C: ConnectionTrait,
    {
        HostSystem::find_by_id(host_system_id)
            .one(db)
            .await
            .map_err(Into::into)
    }
}
