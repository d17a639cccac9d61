//! `FrontdeskStorage`: owns the single read/write connection.
//!
//! All access goes through `with_conn()`, which serializes callers on a
//! mutex. Implements `ICleanupStorage` for the retention job.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use frontdesk_core::errors::StorageError;
use frontdesk_core::traits::ICleanupStorage;
use frontdesk_core::types::NewAuditRecord;
use rusqlite::Connection;

use crate::connection;
use crate::queries;

pub struct FrontdeskStorage {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl FrontdeskStorage {
    /// Open a file-backed store. Applies pragmas and runs migrations.
    pub fn open(path: &Path, busy_timeout_ms: u32) -> Result<Self, StorageError> {
        let conn = connection::open_database(path, busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Mutex::new(connection::open_in_memory()?),
            path: None,
        })
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let guard = self.conn.lock().map_err(|_| StorageError::SqliteError {
            message: "connection lock poisoned".to_string(),
        })?;
        f(&guard)
    }
}

impl ICleanupStorage for FrontdeskStorage {
    fn delete_expired_dependents(&self, cutoff: &str) -> Result<u64, StorageError> {
        self.with_conn(|conn| queries::cleanup::delete_expired_dependents(conn, cutoff))
    }

    fn delete_expired_visits(&self, cutoff: &str) -> Result<u64, StorageError> {
        self.with_conn(|conn| queries::cleanup::delete_expired_visits(conn, cutoff))
    }

    fn delete_orphan_visitors(&self) -> Result<u64, StorageError> {
        self.with_conn(queries::cleanup::delete_orphan_visitors)
    }

    fn insert_audit_record(&self, record: &NewAuditRecord) -> Result<(), StorageError> {
        self.with_conn(|conn| queries::audit::insert_audit_record(conn, record))
    }
}
