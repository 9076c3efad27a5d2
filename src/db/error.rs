use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,

    #[error("Record changed since it was read")]
    Conflict,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Unknown database error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                DatabaseError::Duplicate
            }
            sqlx::Error::Database(ref db_err) if db_err.is_check_violation() => {
                DatabaseError::InvalidInput(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionError(err.to_string())
            }
            other => DatabaseError::Sqlx(other),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationError(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, DatabaseError>;
