//! Normalisation of sqlx errors into the storage taxonomy

use crate::domain::storage::StorageError;

/// Maps a driver error raised while performing `operation`
pub(super) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::RowNotFound => StorageError::not_found(format!("{}: no matching row", operation)),
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation()
                || db_err.is_foreign_key_violation()
                || db_err.is_check_violation() =>
        {
            StorageError::constraint(format!("{}: {}", operation, db_err.message()))
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => {
            StorageError::unavailable(format!("{}: {}", operation, err))
        }
        _ => StorageError::backend(format!("{}: {}", operation, err)),
    }
}
