//! Error types for db_schema_sync

use std::path::PathBuf;

use thiserror::Error;

/// Result type for db_schema_sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for db_schema_sync
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} was not found.")]
    ConfigNotFound(String),

    #[error("{path} is not a valid config file: {reason}")]
    ConfigInvalid { path: String, reason: String },

    #[error("Could not connect to database {database}: {source}")]
    ConnectionFailure {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Table {0} does not exist")]
    TableNotFound(String),

    #[error("Could not extract CREATE TABLE for {table}: {reason}")]
    DumpExtractionFailed { table: String, reason: String },

    #[error("Failed to write {}: {source}", path.display())]
    FileWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl Error {
    /// Errors that only affect the table being processed.
    ///
    /// The sync loop logs these and moves on to the next table; everything
    /// else aborts the run.
    pub fn is_table_scoped(&self) -> bool {
        matches!(
            self,
            Error::TableNotFound(_)
                | Error::DumpExtractionFailed { .. }
                | Error::InvalidStatement(_)
        )
    }
}
