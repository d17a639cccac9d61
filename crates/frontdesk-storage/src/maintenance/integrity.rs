//! Integrity check of the primary database file.
//!
//! Opens a separate read-only handle so it never contends with the
//! read/write connection, and closes it before returning.

use std::path::Path;

use rusqlite::{Connection, ErrorCode, OpenFlags};
use serde::Serialize;
use tracing::{debug, warn};

/// Outcome of inspecting a database file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IntegrityStatus {
    /// `PRAGMA integrity_check` returned the single row `ok`.
    Ok,
    /// No file at the path.
    Missing,
    /// The engine reported problems, one entry per row returned.
    Corrupt(Vec<String>),
    /// The file could not be opened or the check could not run.
    Unreadable(String),
}

impl IntegrityStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// `true` iff the file exists, opens read-only, and checks clean.
/// Never fails; every problem is logged and reported as `false`.
pub fn check_integrity(db_path: &Path) -> bool {
    match inspect_integrity(db_path) {
        IntegrityStatus::Ok => {
            debug!(path = %db_path.display(), "integrity check passed");
            true
        }
        IntegrityStatus::Missing => {
            warn!(path = %db_path.display(), "database file missing");
            false
        }
        IntegrityStatus::Corrupt(problems) => {
            warn!(
                path = %db_path.display(),
                problem_count = problems.len(),
                first_problem = problems.first().map(String::as_str).unwrap_or(""),
                "integrity check failed"
            );
            false
        }
        IntegrityStatus::Unreadable(error) => {
            warn!(path = %db_path.display(), error = %error, "integrity check could not run");
            false
        }
    }
}

/// Run the check and report the detailed status.
pub fn inspect_integrity(db_path: &Path) -> IntegrityStatus {
    if !db_path.exists() {
        return IntegrityStatus::Missing;
    }

    let conn = match Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY) {
        Ok(c) => c,
        Err(e) => return IntegrityStatus::Unreadable(e.to_string()),
    };

    let status = match run_check(&conn) {
        Ok(rows) if rows.len() == 1 && rows[0] == "ok" => IntegrityStatus::Ok,
        Ok(rows) => IntegrityStatus::Corrupt(rows),
        Err(e) if is_corruption(&e) => IntegrityStatus::Corrupt(vec![e.to_string()]),
        Err(e) => IntegrityStatus::Unreadable(e.to_string()),
    };

    if let Err((_, e)) = conn.close() {
        debug!(error = %e, "closing read-only integrity handle failed");
    }
    status
}

fn run_check(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn is_corruption(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if matches!(f.code, ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase)
    )
}
