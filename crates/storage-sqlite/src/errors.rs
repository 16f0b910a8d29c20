//! SQLite failures and their mapping onto `ledgerly_core::Error`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use ledgerly_core::errors::{DatabaseError, Error};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite connection: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Pool checkout: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Diesel: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migrations: {0}")]
    MigrationFailed(String),

    /// A stored column that does not decode (bad decimal, date or enum tag).
    #[error("Corrupt column: {0}")]
    SerializationError(String),

    /// A domain error raised inside a write job; passed through untouched.
    #[error(transparent)]
    Core(Error),
}

impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::Core(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::PoolError(e) => {
                Error::Database(DatabaseError::PoolCreationFailed(e.to_string()))
            }
            StorageError::QueryFailed(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("no matching row".to_string()))
            }
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => Error::Database(DatabaseError::UniqueViolation(info.message().to_string())),
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                info,
            )) => Error::Database(DatabaseError::ForeignKeyViolation(
                info.message().to_string(),
            )),
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::SerializationFailure,
                info,
            )) => Error::Database(DatabaseError::TransactionFailed(info.message().to_string())),
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::MigrationFailed(e) => Error::Database(DatabaseError::MigrationFailed(e)),
            StorageError::SerializationError(e) => Error::Database(DatabaseError::Internal(e)),
            StorageError::Core(e) => e,
        }
    }
}

/// `.into_core()` for Diesel and r2d2 results.
pub trait IntoCore<T> {
    fn into_core(self) -> ledgerly_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> ledgerly_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> ledgerly_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_pass_through() {
        let storage: StorageError = Error::Conflict("template advanced".to_string()).into();
        let back: Error = storage.into();
        assert!(matches!(back, Error::Conflict(msg) if msg == "template advanced"));
    }

    #[test]
    fn test_not_found_maps_to_database_not_found() {
        let back: Error = StorageError::QueryFailed(DieselError::NotFound).into();
        assert!(back.is_not_found());
    }
}
