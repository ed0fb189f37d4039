use thiserror::Error;

/// Errors surfaced by the monitor and check log stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    QueryFailure(#[from] libsql::Error),

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Record not found")]
    NotFound,

    #[error("Unique constraint violation")]
    Conflict,

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl From<deadpool::managed::PoolError<libsql::Error>> for StoreError {
    fn from(error: deadpool::managed::PoolError<libsql::Error>) -> Self {
        StoreError::Unavailable(error.to_string())
    }
}

impl From<uuid::Error> for StoreError {
    fn from(error: uuid::Error) -> Self {
        StoreError::Corrupt(format!("invalid uuid: {error}"))
    }
}
