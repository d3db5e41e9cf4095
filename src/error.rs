//! Error type shared by the persistence layer and the adaptive engine.

use thiserror::Error;

use crate::db::DbLockError;

#[derive(Debug, Error)]
pub enum AdaptiveError {
    /// Storage failure (connection, constraint, timeout). Always propagated
    /// except on the selection-audit path.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database unavailable")]
    DatabaseUnavailable,

    #[error("invalid subject identifier: {0:?}")]
    InvalidSubject(String),
}

impl From<DbLockError> for AdaptiveError {
    fn from(_: DbLockError) -> Self {
        AdaptiveError::DatabaseUnavailable
    }
}

pub type Result<T> = std::result::Result<T, AdaptiveError>;
