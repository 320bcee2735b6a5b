//! Unified error type for the status store and batch initializer.
//!
//! Not-found conditions are never errors here: reads return `Ok(None)` and
//! updates against a missing row return `Ok(false)`.

use thiserror::Error;

/// Errors surfaced by every public operation in the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// A storage statement or connection failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The permission check for a batch start failed
    #[error("Authorization check failed for user {user_id}: {message}")]
    Authorization {
        /// User whose batch was being started
        user_id: i64,
        /// Description reported by the permission check
        message: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
