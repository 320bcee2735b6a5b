//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust models. The pooled `DatabaseConnection` is the
//! connection provider for every store operation: each query checks a connection out of
//! the pool and returns it on every exit path.

use crate::entities::{HostGrant, HostSystem, SystemStatus};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info, instrument};

/// Fallback database location when neither the environment nor keydist.toml names one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/keydist.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Connects to the database at `database_url`.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

/// Establishes a connection using `DATABASE_URL`, falling back to the default `SQLite` file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    connect(&get_database_url()).await
}

/// Creates all necessary database tables if they do not exist yet.
///
/// `host_system` is created first because `status` and `host_grant` reference it.
#[instrument(skip(db))]
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut host_system_table = schema.create_table_from_entity(HostSystem);
    let mut status_table = schema.create_table_from_entity(SystemStatus);
    let mut host_grant_table = schema.create_table_from_entity(HostGrant);
    host_system_table.if_not_exists();
    status_table.if_not_exists();
    host_grant_table.if_not_exists();

    db.execute(builder.build(&host_system_table)).await?;
    db.execute(builder.build(&status_table)).await?;
    db.execute(builder.build(&host_grant_table)).await?;

    info!("Database tables ensured: host_system, status, host_grant");
    Ok(())
}
