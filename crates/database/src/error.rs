// In crates/database/src/error.rs

use core_types::PortError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[from] sqlx::Error),
    #[error("Database migration failed: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("Database operation failed: {0}")]
    OperationFailed(sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Lookup failures surface to the engine as store errors.
pub(crate) fn lookup_failed(err: sqlx::Error) -> PortError {
    match err {
        sqlx::Error::PoolTimedOut => PortError::Store("connection pool timed out".into()),
        other => PortError::Store(other.to_string()),
    }
}

/// Anything that goes wrong between `BEGIN` and `COMMIT` is a settlement failure.
pub(crate) fn settlement_failed(err: sqlx::Error) -> PortError {
    match err {
        // RAISE EXCEPTION inside the settlement function.
        sqlx::Error::Database(db) => PortError::Settlement(db.message().to_string()),
        other => PortError::Settlement(other.to_string()),
    }
}
