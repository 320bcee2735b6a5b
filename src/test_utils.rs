//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and seeding host systems and grants with sensible defaults.

pub(crate) use crate::config::logging::init_test_tracing;
use crate::{
    entities::{host_grant, host_system},
    errors::Result,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = crate::config::database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a host system with the given id.
///
/// # Defaults
/// * `display_name`: `"host-{id}"`
/// * `username`: `"root"`
/// * `host`: `"10.0.0.{id}"`
/// * `port`: 22
/// * `authorized_keys`: `"~/.ssh/authorized_keys"`
pub async fn create_test_host(db: &DatabaseConnection, id: i64) -> Result<host_system::Model> {
    let host = host_system::ActiveModel {
        id: Set(id),
        display_name: Set(format!("host-{id}")),
        username: Set("root".to_string()),
        host: Set(format!("10.0.0.{id}")),
        port: Set(22),
        authorized_keys: Set("~/.ssh/authorized_keys".to_string()),
    };
    host.insert(db).await.map_err(Into::into)
}

/// Creates one host system per id.
pub async fn create_test_hosts(db: &DatabaseConnection, ids: &[i64]) -> Result<()> {
    for &id in ids {
        create_test_host(db, id).await?;
    }
    Ok(())
}

/// Grants `host_system_id` to a non-manager user.
pub async fn grant_host(db: &DatabaseConnection, user_id: i64, host_system_id: i64) -> Result<()> {
    host_grant::ActiveModel {
        user_id: Set(user_id),
        host_system_id: Set(host_system_id),
    }
    .insert(db)
    .await?;
    Ok(())
}
