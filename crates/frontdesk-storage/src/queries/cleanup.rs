//! Bulk deletes behind the compliance retention job.
//!
//! Children are removed by query, not by `ON DELETE CASCADE`, so callers must
//! run these in order: dependents, visits, visitors.

use frontdesk_core::errors::StorageError;
use rusqlite::Connection;

use crate::connection::sqlite_err;

/// Dependents whose parent visit entered before `cutoff`.
pub fn delete_expired_dependents(conn: &Connection, cutoff: &str) -> Result<u64, StorageError> {
    conn.execute(
        "DELETE FROM dependents
         WHERE visit_id IN (SELECT id FROM visits WHERE entry_time < ?1)",
        [cutoff],
    )
    .map(|n| n as u64)
    .map_err(sqlite_err)
}

/// Visits that entered before `cutoff`, regardless of exit time.
pub fn delete_expired_visits(conn: &Connection, cutoff: &str) -> Result<u64, StorageError> {
    conn.execute("DELETE FROM visits WHERE entry_time < ?1", [cutoff])
        .map(|n| n as u64)
        .map_err(sqlite_err)
}

/// Unbanned visitors with no visits left.
pub fn delete_orphan_visitors(conn: &Connection) -> Result<u64, StorageError> {
    conn.execute(
        "DELETE FROM visitors
         WHERE is_banned = 0
           AND NOT EXISTS (SELECT 1 FROM visits WHERE visits.visitor_id = visitors.id)",
        [],
    )
    .map(|n| n as u64)
    .map_err(sqlite_err)
}
