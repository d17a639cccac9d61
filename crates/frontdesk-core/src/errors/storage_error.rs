//! Storage-layer errors for SQLite operations.

use super::error_code::{self, FrontdeskErrorCode};

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Database busy (another operation in progress)")]
    DbBusy,

    #[error("Database corrupt: {details}")]
    DbCorrupt { details: String },

    #[error("Disk full")]
    DiskFull,

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Visitor {visitor_id} is banned")]
    VisitorBanned { visitor_id: i64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrontdeskErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DbBusy => error_code::DB_BUSY,
            Self::DbCorrupt { .. } => error_code::DB_CORRUPT,
            Self::DiskFull => error_code::DISK_FULL,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::NotFound { .. } => error_code::NOT_FOUND,
            Self::VisitorBanned { .. } => error_code::VISITOR_BANNED,
            Self::Io(_) => error_code::IO_ERROR,
            Self::SqliteError { .. } => error_code::STORAGE_ERROR,
        }
    }
}
