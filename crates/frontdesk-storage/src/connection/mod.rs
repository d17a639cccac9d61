//! Connection setup: open, apply pragmas, migrate.

pub mod pragmas;

use std::path::Path;

use frontdesk_core::errors::StorageError;
use rusqlite::{Connection, ErrorCode};

use self::pragmas::apply_pragmas;
use crate::migrations;

/// Open the primary database read/write, apply pragmas and run migrations.
/// Creates the file if it does not exist.
pub fn open_database(path: &Path, busy_timeout_ms: u32) -> Result<Connection, StorageError> {
    let conn = Connection::open(path).map_err(sqlite_err)?;
    apply_pragmas(&conn, busy_timeout_ms)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database with the full schema (for testing).
pub fn open_in_memory() -> Result<Connection, StorageError> {
    let conn = Connection::open_in_memory().map_err(sqlite_err)?;
    apply_pragmas(&conn, 5000)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Map a rusqlite error onto the storage taxonomy.
pub fn sqlite_err(e: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = e {
        match failure.code {
            ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase => {
                return StorageError::DbCorrupt {
                    details: e.to_string(),
                }
            }
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => return StorageError::DbBusy,
            ErrorCode::DiskFull => return StorageError::DiskFull,
            _ => {}
        }
    }
    StorageError::SqliteError {
        message: e.to_string(),
    }
}
