//! Status store - Key placement progress per (host system, user).
//!
//! Rows are partitioned by user purely through the `user_id` filter on every
//! query. Pending work is "any row whose code is pending"; a host that failed for
//! a retryable reason is offered again by [`get_next_pending`] until its code is
//! overwritten through [`update`]. All functions accept any `ConnectionTrait`, so
//! they compose inside a caller's transaction.

use crate::{
    core::catalog::HostCatalog,
    entities::{StatusCode, SystemStatus, host_system, system_status},
    errors::Result,
};
use sea_orm::{
    QueryOrder, Set,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use tracing::{debug, error, instrument, warn};

/// A status row joined with the host system it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostStatus {
    /// Catalog record of the host
    pub host: host_system::Model,
    /// Current placement status for the requesting user
    pub status: StatusCode,
}

/// Every status of a user's batch plus tallies by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    /// Rows ordered by host system id
    pub items: Vec<HostStatus>,
    /// Rows still offered by the next-pending poll (includes retryable failures)
    pub pending: usize,
    /// Rows claimed by a poller without an outcome yet
    pub in_progress: usize,
    /// Rows where the key was placed
    pub succeeded: usize,
    /// Rows that failed for a non-retryable reason
    pub failed: usize,
}

impl StatusSummary {
    /// Whether no host is left to try or waiting on an outcome.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.pending == 0 && self.in_progress == 0
    }
}

fn pending_codes() -> [&'static str; 3] {
    StatusCode::PENDING.map(StatusCode::as_str)
}

/// Attaches the catalog record to a status row; `None` if the host is unknown.
async fn attach_host<C, H>(
    db: &C,
    catalog: &H,
    row: system_status::Model,
) -> Result<Option<HostStatus>>
where
    C: ConnectionTrait,
    H: HostCatalog,
{
    let host = catalog.fetch_host(db, row.host_system_id).await?;
    if host.is_none() {
        warn!(
            "Status row for host {} (user {}) has no catalog entry; skipping",
            row.host_system_id, row.user_id
        );
    }
    Ok(host.map(|host| HostStatus {
        host,
        status: row.status_cd,
    }))
}

/// Deletes every status row for `user_id`, returning how many were removed.
///
/// Removing zero rows is not an error.
#[instrument(skip(db))]
pub async fn reset_all<C>(db: &C, user_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = SystemStatus::delete_many()
        .filter(system_status::Column::UserId.eq(user_id))
        .exec(db)
        .await
        .inspect_err(|e| error!("Failed to reset statuses for user {user_id}: {e}"))?;

    debug!("Removed {} status rows for user {user_id}", result.rows_affected);
    Ok(result.rows_affected)
}

/// Records `status` for the (host, user) pair.
///
/// An existing row for the pair is overwritten rather than duplicated.
#[instrument(skip(db))]
pub async fn insert<C>(db: &C, host_system_id: i64, status: StatusCode, user_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let row = system_status::ActiveModel {
        host_system_id: Set(host_system_id),
        user_id: Set(user_id),
        status_cd: Set(status),
    };

    SystemStatus::insert(row)
        .on_conflict(
            OnConflict::columns([
                system_status::Column::HostSystemId,
                system_status::Column::UserId,
            ])
            .update_column(system_status::Column::StatusCd)
            .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .inspect_err(|e| {
            error!(
                "Failed to insert status for host {} (user {}): {}",
                host_system_id, user_id, e
            );
        })?;
    Ok(())
}

/// Overwrites the status of an existing (host, user) row.
///
/// Returns `false` without creating anything when no row matches, so a host that
/// left the batch mid-flight does not abort the caller's loop.
#[instrument(skip(db))]
pub async fn update<C>(
    db: &C,
    host_system_id: i64,
    status: StatusCode,
    user_id: i64,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = SystemStatus::update_many()
        .col_expr(
            system_status::Column::StatusCd,
            Expr::value(status.as_str()),
        )
        .filter(system_status::Column::HostSystemId.eq(host_system_id))
        .filter(system_status::Column::UserId.eq(user_id))
        .exec(db)
        .await
        .inspect_err(|e| {
            error!(
                "Failed to update status for host {} (user {}): {}",
                host_system_id, user_id, e
            );
        })?;

    if result.rows_affected == 0 {
        debug!("Update ignored: no row for ({host_system_id}, {user_id})");
    }
    Ok(result.rows_affected > 0)
}

/// Returns every status for `user_id`, ordered by host system id ascending.
///
/// Rows whose host is no longer in the catalog are left out.
#[instrument(skip(db, catalog))]
pub async fn get_all<C, H>(db: &C, catalog: &H, user_id: i64) -> Result<Vec<HostStatus>>
where
    C: ConnectionTrait,
    H: HostCatalog,
{
    let rows = SystemStatus::find()
        .filter(system_status::Column::UserId.eq(user_id))
        .order_by_asc(system_status::Column::HostSystemId)
        .all(db)
        .await
        .inspect_err(|e| error!("Failed to list statuses for user {user_id}: {e}"))?;

    let mut statuses = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(status) = attach_host(db, catalog, row).await? {
            statuses.push(status);
        }
    }
    Ok(statuses)
}

/// Returns the status of one host for `user_id`, `None` if the row or host is absent.
#[instrument(skip(db, catalog))]
pub async fn get<C, H>(
    db: &C,
    catalog: &H,
    host_system_id: i64,
    user_id: i64,
) -> Result<Option<HostStatus>>
where
    C: ConnectionTrait,
    H: HostCatalog,
{
    let row = SystemStatus::find_by_id((host_system_id, user_id))
        .one(db)
        .await
        .inspect_err(|e| {
            error!(
                "Failed to read status for host {} (user {}): {}",
                host_system_id, user_id, e
            );
        })?;

    match row {
        Some(row) => attach_host(db, catalog, row).await,
        None => Ok(None),
    }
}

/// Lowest-id pending row for `user_id` with a host id above `after`.
async fn next_pending_row<C>(
    db: &C,
    user_id: i64,
    after: i64,
) -> Result<Option<system_status::Model>>
where
    C: ConnectionTrait,
{
    SystemStatus::find()
        .filter(system_status::Column::UserId.eq(user_id))
        .filter(system_status::Column::StatusCd.is_in(pending_codes()))
        .filter(system_status::Column::HostSystemId.gt(after))
        .order_by_asc(system_status::Column::HostSystemId)
        .one(db)
        .await
        .inspect_err(|e| error!("Failed to poll pending statuses for user {user_id}: {e}"))
        .map_err(Into::into)
}

/// Returns the lowest-id pending host for `user_id` without claiming it.
///
/// Calling again before [`update`] returns the same host. Pending rows whose host
/// is missing from the catalog are passed over.
#[instrument(skip(db, catalog))]
pub async fn get_next_pending<C, H>(db: &C, catalog: &H, user_id: i64) -> Result<Option<HostStatus>>
where
    C: ConnectionTrait,
    H: HostCatalog,
{
    let mut after = i64::MIN;
    while let Some(row) = next_pending_row(db, user_id, after).await? {
        after = row.host_system_id;
        if let Some(status) = attach_host(db, catalog, row).await? {
            return Ok(Some(status));
        }
    }
    Ok(None)
}

/// Atomically claims the lowest-id pending host for `user_id`.
///
/// The row moves to [`StatusCode::InProgress`] through a conditional update, so two
/// pollers can never claim the same host. The returned status is `InProgress`; the
/// caller writes the outcome with [`update`]. Rows whose host is missing from the
/// catalog are passed over and keep their code.
#[instrument(skip(db, catalog))]
pub async fn claim_next_pending<C, H>(
    db: &C,
    catalog: &H,
    user_id: i64,
) -> Result<Option<HostStatus>>
where
    C: ConnectionTrait,
    H: HostCatalog,
{
    let mut after = i64::MIN;
    while let Some(candidate) = next_pending_row(db, user_id, after).await? {
        let host_system_id = candidate.host_system_id;
        let Some(host) = catalog.fetch_host(db, host_system_id).await? else {
            warn!(
                "Status row for host {} (user {}) has no catalog entry; skipping",
                host_system_id, user_id
            );
            after = host_system_id;
            continue;
        };

        let claimed = SystemStatus::update_many()
            .col_expr(
                system_status::Column::StatusCd,
                Expr::value(StatusCode::InProgress.as_str()),
            )
            .filter(system_status::Column::HostSystemId.eq(host_system_id))
            .filter(system_status::Column::UserId.eq(user_id))
            .filter(system_status::Column::StatusCd.is_in(pending_codes()))
            .exec(db)
            .await
            .inspect_err(|e| {
                error!(
                    "Failed to claim host {} (user {}): {}",
                    host_system_id, user_id, e
                );
            })?;

        if claimed.rows_affected == 0 {
            warn!(
                "Host {} (user {}) was claimed concurrently; retrying",
                host_system_id, user_id
            );
            after = host_system_id;
            continue;
        }

        return Ok(Some(HostStatus {
            host,
            status: StatusCode::InProgress,
        }));
    }
    Ok(None)
}

/// Returns every status for `user_id` together with per-outcome counts.
#[instrument(skip(db, catalog))]
pub async fn get_summary<C, H>(db: &C, catalog: &H, user_id: i64) -> Result<StatusSummary>
where
    C: ConnectionTrait,
    H: HostCatalog,
{
    let items = get_all(db, catalog, user_id).await?;
    let mut summary = StatusSummary::default();
    for item in &items {
        match item.status {
            code if code.is_pending() => summary.pending += 1,
            StatusCode::InProgress => summary.in_progress += 1,
            StatusCode::Success => summary.succeeded += 1,
            _ => summary.failed += 1,
        }
    }
    summary.items = items;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{core::catalog::DbHostCatalog, errors::Error, test_utils::*};
    use sea_orm::{DatabaseBackend, MockDatabase};

    /// Catalog that forgets the listed hosts, as if they were removed meanwhile.
    struct ForgetfulCatalog(Vec<i64>);

    impl HostCatalog for ForgetfulCatalog {
        async fn fetch_host<C>(
            &self,
            db: &C,
            host_system_id: i64,
        ) -> Result<Option<host_system::Model>>
        where
            C: ConnectionTrait,
        {
            if self.0.contains(&host_system_id) {
                return Ok(None);
            }
            DbHostCatalog.fetch_host(db, host_system_id).await
        }
    }

    fn codes(statuses: &[HostStatus]) -> Vec<(i64, StatusCode)> {
        statuses.iter().map(|s| (s.host.id, s.status)).collect()
    }

    #[tokio::test]
    async fn test_get_all_orders_by_host_id() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        create_test_hosts(&db, &[10, 20, 30]).await?;

        insert(&db, 30, StatusCode::Initial, 7).await?;
        insert(&db, 10, StatusCode::Success, 7).await?;
        insert(&db, 20, StatusCode::AuthFail, 7).await?;

        let all = get_all(&db, &DbHostCatalog, 7).await?;
        assert_eq!(
            codes(&all),
            vec![
                (10, StatusCode::Success),
                (20, StatusCode::AuthFail),
                (30, StatusCode::Initial),
            ]
        );
        assert_eq!(all[0].host.display_name, "host-10");
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_twice_keeps_one_row() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_host(&db, 10).await?;

        insert(&db, 10, StatusCode::Initial, 7).await?;
        insert(&db, 10, StatusCode::HostFail, 7).await?;

        let rows = SystemStatus::find().all(&db).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status_cd, StatusCode::HostFail);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_then_get_round_trips() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_host(&db, 10).await?;
        insert(&db, 10, StatusCode::Initial, 7).await?;

        assert!(update(&db, 10, StatusCode::PublicKeyFail, 7).await?);

        let status = get(&db, &DbHostCatalog, 10, 7).await?.unwrap();
        assert_eq!(status.status, StatusCode::PublicKeyFail);
        assert_eq!(status.host.id, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_row_is_noop() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_host(&db, 10).await?;

        assert!(!update(&db, 10, StatusCode::Success, 7).await?);
        assert!(get(&db, &DbHostCatalog, 10, 7).await?.is_none());
        assert!(SystemStatus::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_all_only_touches_one_user() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_hosts(&db, &[10, 20]).await?;
        insert(&db, 10, StatusCode::Initial, 7).await?;
        insert(&db, 20, StatusCode::Initial, 7).await?;
        insert(&db, 10, StatusCode::Initial, 8).await?;

        assert_eq!(reset_all(&db, 7).await?, 2);
        assert_eq!(reset_all(&db, 7).await?, 0);

        assert!(get_all(&db, &DbHostCatalog, 7).await?.is_empty());
        assert_eq!(get_all(&db, &DbHostCatalog, 8).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_next_pending_is_a_peek() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_hosts(&db, &[10, 20, 30]).await?;
        insert(&db, 10, StatusCode::Success, 7).await?;
        insert(&db, 20, StatusCode::PublicKeyFail, 7).await?;
        insert(&db, 30, StatusCode::Initial, 7).await?;

        let first = get_next_pending(&db, &DbHostCatalog, 7).await?.unwrap();
        let again = get_next_pending(&db, &DbHostCatalog, 7).await?.unwrap();
        assert_eq!(first.host.id, 20);
        assert_eq!(first, again);
        Ok(())
    }

    #[tokio::test]
    async fn test_next_pending_none_when_all_terminal() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_hosts(&db, &[10, 20, 30]).await?;
        insert(&db, 10, StatusCode::Success, 7).await?;
        insert(&db, 20, StatusCode::HostFail, 7).await?;
        insert(&db, 30, StatusCode::GenericFail, 7).await?;

        assert!(get_next_pending(&db, &DbHostCatalog, 7).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_are_isolated_per_user() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_host(&db, 10).await?;
        insert(&db, 10, StatusCode::Initial, 7).await?;

        assert!(get_all(&db, &DbHostCatalog, 8).await?.is_empty());
        assert!(get(&db, &DbHostCatalog, 10, 8).await?.is_none());
        assert!(get_next_pending(&db, &DbHostCatalog, 8).await?.is_none());
        assert!(!update(&db, 10, StatusCode::Success, 8).await?);

        let still = get(&db, &DbHostCatalog, 10, 7).await?.unwrap();
        assert_eq!(still.status, StatusCode::Initial);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_catalog_entry_is_skipped() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_hosts(&db, &[10, 20]).await?;
        insert(&db, 10, StatusCode::Initial, 7).await?;
        insert(&db, 20, StatusCode::Initial, 7).await?;
        let catalog = ForgetfulCatalog(vec![10]);

        assert_eq!(
            codes(&get_all(&db, &catalog, 7).await?),
            vec![(20, StatusCode::Initial)]
        );
        assert!(get(&db, &catalog, 10, 7).await?.is_none());

        let next = get_next_pending(&db, &catalog, 7).await?.unwrap();
        assert_eq!(next.host.id, 20);
        Ok(())
    }

    #[tokio::test]
    async fn test_claim_moves_row_out_of_pending() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_hosts(&db, &[10, 20]).await?;
        insert(&db, 10, StatusCode::AuthFail, 7).await?;
        insert(&db, 20, StatusCode::Initial, 7).await?;

        let claimed = claim_next_pending(&db, &DbHostCatalog, 7).await?.unwrap();
        assert_eq!(claimed.host.id, 10);
        assert_eq!(claimed.status, StatusCode::InProgress);

        let next = get_next_pending(&db, &DbHostCatalog, 7).await?.unwrap();
        assert_eq!(next.host.id, 20);

        update(&db, 10, StatusCode::Success, 7).await?;
        let stored = get(&db, &DbHostCatalog, 10, 7).await?.unwrap();
        assert_eq!(stored.status, StatusCode::Success);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_claims_never_share_a_host() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_hosts(&db, &[10, 20, 30]).await?;
        for id in [10, 20, 30] {
            insert(&db, id, StatusCode::Initial, 7).await?;
        }

        let (a, b, c, d) = tokio::join!(
            claim_next_pending(&db, &DbHostCatalog, 7),
            claim_next_pending(&db, &DbHostCatalog, 7),
            claim_next_pending(&db, &DbHostCatalog, 7),
            claim_next_pending(&db, &DbHostCatalog, 7),
        );

        let mut ids: Vec<i64> = [a?, b?, c?, d?]
            .into_iter()
            .flatten()
            .map(|s| s.host.id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![10, 20, 30]);
        assert!(claim_next_pending(&db, &DbHostCatalog, 7).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_claim_leaves_unresolvable_host_pending() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_hosts(&db, &[10, 20]).await?;
        insert(&db, 10, StatusCode::Initial, 7).await?;
        insert(&db, 20, StatusCode::Initial, 7).await?;
        let catalog = ForgetfulCatalog(vec![10]);

        let claimed = claim_next_pending(&db, &catalog, 7).await?.unwrap();
        assert_eq!(claimed.host.id, 20);
        update(&db, 20, StatusCode::Success, 7).await?;
        assert!(claim_next_pending(&db, &catalog, 7).await?.is_none());

        // host 10 was never handed out, so it must not be stuck in progress
        let row = SystemStatus::find_by_id((10, 7)).one(&db).await?.unwrap();
        assert_eq!(row.status_cd, StatusCode::Initial);

        let summary = get_summary(&db, &DbHostCatalog, 7).await?;
        assert_eq!(summary.in_progress, 0);
        assert_eq!(summary.pending, 1);

        let next = get_next_pending(&db, &DbHostCatalog, 7).await?.unwrap();
        assert_eq!(next.host.id, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_next_pending_walks_past_several_missing_hosts() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_hosts(&db, &[10, 20, 30, 40]).await?;
        insert(&db, 10, StatusCode::Initial, 7).await?;
        insert(&db, 20, StatusCode::PublicKeyFail, 7).await?;
        insert(&db, 30, StatusCode::Success, 7).await?;
        insert(&db, 40, StatusCode::AuthFail, 7).await?;
        let catalog = ForgetfulCatalog(vec![10, 20]);

        let next = get_next_pending(&db, &catalog, 7).await?.unwrap();
        assert_eq!(next.host.id, 40);
        assert_eq!(next.status, StatusCode::AuthFail);

        let everything_gone = ForgetfulCatalog(vec![10, 20, 40]);
        assert!(get_next_pending(&db, &everything_gone, 7).await?.is_none());
        let claimed = claim_next_pending(&db, &everything_gone, 7).await?;
        assert!(claimed.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_counts_outcomes() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_hosts(&db, &[1, 2, 3, 4, 5]).await?;
        insert(&db, 1, StatusCode::Initial, 7).await?;
        insert(&db, 2, StatusCode::AuthFail, 7).await?;
        insert(&db, 3, StatusCode::InProgress, 7).await?;
        insert(&db, 4, StatusCode::Success, 7).await?;
        insert(&db, 5, StatusCode::HostFail, 7).await?;

        let summary = get_summary(&db, &DbHostCatalog, 7).await?;
        assert_eq!(summary.items.len(), 5);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.in_progress, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_complete());

        let empty = get_summary(&db, &DbHostCatalog, 99).await?;
        assert!(empty.is_complete());
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported_not_empty() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_errors([DbErr::Custom("disk I/O error".to_string())])
            .into_connection();

        let result = get_next_pending(&db, &DbHostCatalog, 7).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }
}
