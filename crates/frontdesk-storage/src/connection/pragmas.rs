//! PRAGMA setup applied to every read/write connection.

use frontdesk_core::errors::StorageError;
use rusqlite::Connection;

use super::sqlite_err;

/// WAL journal, NORMAL sync, enforced foreign keys, busy timeout.
pub fn apply_pragmas(conn: &Connection, busy_timeout_ms: u32) -> Result<(), StorageError> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA temp_store = MEMORY;
        "
    ))
    .map_err(sqlite_err)
}
