//! Batch initializer - Starts a key distribution batch for one user.
//!
//! A batch start narrows the requested hosts to those the user may act on, wipes
//! the user's previous statuses and seeds one `INITIAL` row per remaining host.
//! Reset and seeding share one database transaction, and starts for the same
//! user are serialized through a per-user lock.

use crate::{
    core::{
        auth::{PermissionCheck, UserRole},
        status,
    },
    entities::StatusCode,
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::{error, info, instrument};

/// Result of a successful batch start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// User the batch belongs to
    pub user_id: i64,
    /// Hosts seeded with `INITIAL`, ascending and without duplicates
    pub host_system_ids: Vec<i64>,
    /// Status rows removed from the previous batch
    pub cleared: u64,
}

type UserLocks = Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>;

/// Starts batches, scoping non-manager users through `P`.
#[derive(Debug, Default)]
pub struct BatchInitializer<P> {
    permissions: P,
    locks: UserLocks,
}

impl<P> BatchInitializer<P>
where
    P: PermissionCheck,
{
    /// Creates an initializer around a permission check.
    pub fn new(permissions: P) -> Self {
        Self {
            permissions,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, user_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user_id).or_default())
    }

    fn release(&self, user_id: i64, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // map + ours: nobody else is waiting
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&user_id);
        }
    }

    /// Starts a new batch for `user_id` over `requested_host_ids`.
    ///
    /// Previous statuses of the user are removed even when no host survives the
    /// permission check. On any failure nothing is changed.
    ///
    /// # Errors
    /// `Error::Authorization` if the permission check fails, `Error::Database` if
    /// the reset or seeding fails (the transaction is rolled back).
    #[instrument(skip(self, db))]
    pub async fn start_batch<C>(
        &self,
        db: &C,
        requested_host_ids: &[i64],
        user_id: i64,
        role: UserRole,
    ) -> Result<BatchOutcome>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let lock = self.lock_for(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.start_batch_locked(db, requested_host_ids, user_id, role)
                .await
        };
        self.release(user_id, lock);

        result.inspect_err(|e| error!("Batch for user {} not started: {}", user_id, e))
    }

    async fn start_batch_locked<C>(
        &self,
        db: &C,
        requested_host_ids: &[i64],
        user_id: i64,
        role: UserRole,
    ) -> Result<BatchOutcome>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let mut host_ids = if role.is_manager() {
            requested_host_ids.to_vec()
        } else {
            self.permissions
                .filter_authorized(db, requested_host_ids, user_id)
                .await
                .map_err(|e| match e {
                    err @ Error::Authorization { .. } => err,
                    other => Error::Authorization {
                        user_id,
                        message: other.to_string(),
                    },
                })?
        };
        host_ids.sort_unstable();
        host_ids.dedup();

        let txn = db.begin().await?;
        let cleared = status::reset_all(&txn, user_id).await?;
        for &host_system_id in &host_ids {
            status::insert(&txn, host_system_id, StatusCode::Initial, user_id).await?;
        }
        txn.commit().await?;

        info!(
            "Started batch for user {}: {} hosts seeded, {} old statuses cleared",
            user_id,
            host_ids.len(),
            cleared
        );
        Ok(BatchOutcome {
            user_id,
            host_system_ids: host_ids,
            cleared,
        })
    }
}
