//! Visitor profile registration, lookup and ban/unban.

use chrono::{DateTime, Utc};
use frontdesk_core::clock::to_iso8601;
use frontdesk_core::errors::StorageError;
use frontdesk_core::types::{NewVisitor, Visitor, VisitorId};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::connection::sqlite_err;

const VISITOR_COLUMNS: &str = "id, first_name, last_name, photo_path, is_banned, created_at";

/// Insert a new visitor profile. Returns its id.
pub fn register_visitor(
    conn: &Connection,
    visitor: &NewVisitor,
    now: DateTime<Utc>,
) -> Result<VisitorId, StorageError> {
    conn.execute(
        "INSERT INTO visitors (first_name, last_name, photo_path, is_banned, created_at)
         VALUES (?1, ?2, ?3, 0, ?4)",
        params![
            visitor.first_name.trim(),
            visitor.last_name.trim(),
            visitor.photo_path,
            to_iso8601(now),
        ],
    )
    .map_err(sqlite_err)?;
    Ok(conn.last_insert_rowid())
}

pub fn get_visitor(conn: &Connection, id: VisitorId) -> Result<Option<Visitor>, StorageError> {
    conn.query_row(
        &format!("SELECT {VISITOR_COLUMNS} FROM visitors WHERE id = ?1"),
        [id],
        map_visitor,
    )
    .optional()
    .map_err(sqlite_err)
}

/// Case-insensitive match of `fragment` against first, last or full name.
pub fn find_visitors_by_name(
    conn: &Connection,
    fragment: &str,
    limit: u32,
) -> Result<Vec<Visitor>, StorageError> {
    let pattern = like_pattern(fragment);
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {VISITOR_COLUMNS} FROM visitors
             WHERE first_name LIKE ?1 ESCAPE '\\'
                OR last_name LIKE ?1 ESCAPE '\\'
                OR (first_name || ' ' || last_name) LIKE ?1 ESCAPE '\\'
             ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE
             LIMIT ?2"
        ))
        .map_err(sqlite_err)?;
    let rows = stmt
        .query_map(params![pattern, limit], map_visitor)
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sqlite_err)?;
    Ok(rows)
}

/// Ban or unban a visitor. Returns `false` if no such visitor exists.
pub fn set_banned(conn: &Connection, id: VisitorId, banned: bool) -> Result<bool, StorageError> {
    let changed = conn
        .execute(
            "UPDATE visitors SET is_banned = ?1 WHERE id = ?2",
            params![banned as i64, id],
        )
        .map_err(sqlite_err)?;
    Ok(changed > 0)
}

pub fn banned_visitors(conn: &Connection) -> Result<Vec<Visitor>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {VISITOR_COLUMNS} FROM visitors WHERE is_banned = 1
             ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE"
        ))
        .map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], map_visitor)
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sqlite_err)?;
    Ok(rows)
}

pub fn count_visitors(conn: &Connection) -> Result<u64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM visitors", [], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
        .map_err(sqlite_err)
}

fn map_visitor(row: &Row<'_>) -> rusqlite::Result<Visitor> {
    Ok(Visitor {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        photo_path: row.get(3)?,
        is_banned: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
    })
}

/// Wrap a user fragment in `%…%`, escaping LIKE metacharacters.
pub(crate) fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::open_in_memory;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn visitor(first: &str, last: &str) -> NewVisitor {
        NewVisitor {
            first_name: first.to_string(),
            last_name: last.to_string(),
            photo_path: Some(format!("uploads/{first}.jpg")),
        }
    }

    #[test]
    fn register_and_get() {
        let conn = open_in_memory().unwrap();
        let id = register_visitor(&conn, &visitor(" Grace ", "Hopper"), now()).unwrap();
        let v = get_visitor(&conn, id).unwrap().unwrap();
        assert_eq!(v.first_name, "Grace");
        assert_eq!(v.full_name(), "Grace Hopper");
        assert!(!v.is_banned);
        assert_eq!(v.created_at, "2025-03-01T12:00:00.000Z");
        assert!(get_visitor(&conn, id + 100).unwrap().is_none());
    }

    #[test]
    fn ban_and_unban() {
        let conn = open_in_memory().unwrap();
        let id = register_visitor(&conn, &visitor("Mallory", "Example"), now()).unwrap();

        assert!(set_banned(&conn, id, true).unwrap());
        assert!(get_visitor(&conn, id).unwrap().unwrap().is_banned);
        assert_eq!(banned_visitors(&conn).unwrap().len(), 1);

        assert!(set_banned(&conn, id, false).unwrap());
        assert!(!get_visitor(&conn, id).unwrap().unwrap().is_banned);
        assert!(!set_banned(&conn, 9999, true).unwrap());
    }

    #[test]
    fn name_search_is_case_insensitive_and_escaped() {
        let conn = open_in_memory().unwrap();
        register_visitor(&conn, &visitor("Alan", "Turing"), now()).unwrap();
        register_visitor(&conn, &visitor("Alonzo", "Church"), now()).unwrap();
        register_visitor(&conn, &visitor("100%", "Sure"), now()).unwrap();

        let hits = find_visitors_by_name(&conn, "al", 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(find_visitors_by_name(&conn, "alan turing", 10).unwrap().len(), 1);
        assert_eq!(find_visitors_by_name(&conn, "%", 10).unwrap().len(), 1);
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern(" x "), "%x%");
    }
}
