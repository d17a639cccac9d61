//! Audit log insert and query. Rows are never updated or deleted.

use chrono::{DateTime, Utc};
use frontdesk_core::clock::to_iso8601;
use frontdesk_core::errors::StorageError;
use frontdesk_core::types::audit::CLIENT_ERROR;
use frontdesk_core::types::{AuditRecord, AuditStatus, NewAuditRecord};
use rusqlite::{params, Connection};

use crate::connection::sqlite_err;

/// Longest client-supplied message stored in an event name.
const MAX_CLIENT_MESSAGE: usize = 500;

pub fn insert_audit_record(conn: &Connection, record: &NewAuditRecord) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO audit_logs
         (event_name, timestamp, status, profiles_deleted, visits_deleted, dependents_deleted)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.event_name,
            record.timestamp,
            record.status.as_str(),
            record.profiles_deleted as i64,
            record.visits_deleted as i64,
            record.dependents_deleted as i64,
        ],
    )
    .map_err(sqlite_err)?;
    Ok(())
}

/// Newest records first.
pub fn list_audit_records(conn: &Connection, limit: u32) -> Result<Vec<AuditRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, event_name, timestamp, status,
                    profiles_deleted, visits_deleted, dependents_deleted
             FROM audit_logs
             ORDER BY id DESC
             LIMIT ?1",
        )
        .map_err(sqlite_err)?;
    let rows = stmt
        .query_map([limit], |row| {
            Ok(AuditRecord {
                id: row.get(0)?,
                event_name: row.get(1)?,
                timestamp: row.get(2)?,
                status: AuditStatus::parse(&row.get::<_, String>(3)?),
                profiles_deleted: row.get::<_, i64>(4)? as u64,
                visits_deleted: row.get::<_, i64>(5)? as u64,
                dependents_deleted: row.get::<_, i64>(6)? as u64,
            })
        })
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sqlite_err)?;
    Ok(rows)
}

pub fn count_audit_records(conn: &Connection) -> Result<u64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM audit_logs", [], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
        .map_err(sqlite_err)
}

/// Record an error reported by the front-desk client as an `ERROR` row
/// with zero counts.
pub fn record_client_error(
    conn: &Connection,
    message: &str,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let message: String = message.trim().chars().take(MAX_CLIENT_MESSAGE).collect();
    let event_name = if message.is_empty() {
        CLIENT_ERROR.to_string()
    } else {
        format!("{CLIENT_ERROR}: {message}")
    };
    insert_audit_record(
        conn,
        &NewAuditRecord {
            event_name,
            timestamp: to_iso8601(now),
            status: AuditStatus::Error,
            profiles_deleted: 0,
            visits_deleted: 0,
            dependents_deleted: 0,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::open_in_memory;
    use chrono::TimeZone;

    #[test]
    fn insert_then_list_newest_first() {
        let conn = open_in_memory().unwrap();
        for (i, status) in [AuditStatus::Ok, AuditStatus::Error].into_iter().enumerate() {
            insert_audit_record(
                &conn,
                &NewAuditRecord {
                    event_name: format!("event {i}"),
                    timestamp: "2025-01-01T00:00:00.000Z".into(),
                    status,
                    profiles_deleted: i as u64,
                    visits_deleted: 2,
                    dependents_deleted: 3,
                },
            )
            .unwrap();
        }

        let rows = list_audit_records(&conn, 10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].event_name, "event 1");
        assert_eq!(rows[0].status, AuditStatus::Error);
        assert_eq!(rows[0].profiles_deleted, 1);
        assert_eq!(rows[1].status, AuditStatus::Ok);
        assert_eq!(count_audit_records(&conn).unwrap(), 2);
    }

    #[test]
    fn client_error_is_truncated_error_row() {
        let conn = open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 5, 5, 5, 5, 5).unwrap();
        record_client_error(&conn, &"x".repeat(2000), now).unwrap();
        record_client_error(&conn, "   ", now).unwrap();

        let rows = list_audit_records(&conn, 10).unwrap();
        assert_eq!(rows[0].event_name, "Client Error");
        assert_eq!(rows[1].status, AuditStatus::Error);
        assert_eq!(rows[1].event_name.len(), "Client Error: ".len() + 500);
        assert_eq!(rows[1].timestamp, "2025-05-05T05:05:05.000Z");
    }
}
