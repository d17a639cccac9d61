//! Sign-in / sign-out and visit history search.
//!
//! Dependents are loaded with a second batched query keyed by visit id and
//! attached as a nested `Vec`, never aggregated into a delimited string.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use frontdesk_core::clock::to_iso8601;
use frontdesk_core::errors::StorageError;
use frontdesk_core::types::{
    Dependent, NewVisit, Visit, VisitHistoryRow, VisitId, VisitQuery, VisitorId,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::visitors::like_pattern;
use crate::connection::sqlite_err;

/// Upper bound on bound parameters per dependents lookup.
const DEPENDENT_BATCH: usize = 500;

const HISTORY_SELECT: &str = "SELECT v.id, v.visitor_id, v.entry_time, v.exit_time, v.unit,
        v.person_visited, v.purpose, v.notes, p.first_name, p.last_name, p.is_banned
     FROM visits v JOIN visitors p ON p.id = v.visitor_id";

/// Record a sign-in together with its dependents.
///
/// Fails with `NotFound` for an unknown visitor and `VisitorBanned` for a
/// banned one. The visit and its dependents are written in one transaction.
pub fn sign_in(
    conn: &Connection,
    visit: &NewVisit,
    now: DateTime<Utc>,
) -> Result<VisitId, StorageError> {
    let tx = conn.unchecked_transaction().map_err(sqlite_err)?;

    let banned: Option<i64> = tx
        .query_row(
            "SELECT is_banned FROM visitors WHERE id = ?1",
            [visit.visitor_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(sqlite_err)?;
    match banned {
        None => {
            return Err(StorageError::NotFound {
                entity: "visitor",
                id: visit.visitor_id,
            })
        }
        Some(flag) if flag != 0 => {
            return Err(StorageError::VisitorBanned {
                visitor_id: visit.visitor_id,
            })
        }
        Some(_) => {}
    }

    tx.execute(
        "INSERT INTO visits (visitor_id, entry_time, exit_time, unit, person_visited, purpose, notes)
         VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6)",
        params![
            visit.visitor_id,
            to_iso8601(now),
            visit.unit.trim(),
            visit.person_visited.trim(),
            visit.purpose,
            visit.notes,
        ],
    )
    .map_err(sqlite_err)?;
    let visit_id = tx.last_insert_rowid();

    {
        let mut stmt = tx
            .prepare_cached(
                "INSERT INTO dependents (visit_id, full_name, age) VALUES (?1, ?2, ?3)",
            )
            .map_err(sqlite_err)?;
        for dependent in &visit.dependents {
            stmt.execute(params![visit_id, dependent.full_name.trim(), dependent.age])
                .map_err(sqlite_err)?;
        }
    }

    tx.commit().map_err(sqlite_err)?;
    Ok(visit_id)
}

/// Stamp the exit time. Returns `false` if the visit is unknown or already signed out.
pub fn sign_out(conn: &Connection, visit_id: VisitId, now: DateTime<Utc>) -> Result<bool, StorageError> {
    let changed = conn
        .execute(
            "UPDATE visits SET exit_time = ?1 WHERE id = ?2 AND exit_time IS NULL",
            params![to_iso8601(now), visit_id],
        )
        .map_err(sqlite_err)?;
    Ok(changed > 0)
}

pub fn get_visit(conn: &Connection, visit_id: VisitId) -> Result<Option<Visit>, StorageError> {
    let visit = conn
        .query_row(
            "SELECT id, visitor_id, entry_time, exit_time, unit, person_visited, purpose, notes
             FROM visits WHERE id = ?1",
            [visit_id],
            map_visit,
        )
        .optional()
        .map_err(sqlite_err)?;

    match visit {
        Some(mut visit) => {
            let mut dependents = load_dependents(conn, &[visit.id])?;
            visit.dependents = dependents.remove(&visit.id).unwrap_or_default();
            Ok(Some(visit))
        }
        None => Ok(None),
    }
}

/// All visits for one visitor, newest first.
pub fn visits_for_visitor(conn: &Connection, visitor_id: VisitorId) -> Result<Vec<Visit>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, visitor_id, entry_time, exit_time, unit, person_visited, purpose, notes
             FROM visits WHERE visitor_id = ?1
             ORDER BY entry_time DESC, id DESC",
        )
        .map_err(sqlite_err)?;
    let mut visits = stmt
        .query_map([visitor_id], map_visit)
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sqlite_err)?;
    attach_dependents(conn, visits.iter_mut())?;
    Ok(visits)
}

/// Everyone currently on site (no exit time), oldest entry first.
pub fn active_visits(conn: &Connection) -> Result<Vec<VisitHistoryRow>, StorageError> {
    let sql = format!("{HISTORY_SELECT} WHERE v.exit_time IS NULL ORDER BY v.entry_time ASC, v.id ASC");
    query_history(conn, &sql, Vec::new())
}

/// History search, newest entry first.
pub fn search_visits(conn: &Connection, query: &VisitQuery) -> Result<Vec<VisitHistoryRow>, StorageError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(name) = query.name.as_deref().filter(|n| !n.trim().is_empty()) {
        values.push(Value::Text(like_pattern(name)));
        let n = values.len();
        clauses.push(format!(
            "(p.first_name LIKE ?{n} ESCAPE '\\' OR p.last_name LIKE ?{n} ESCAPE '\\'
              OR (p.first_name || ' ' || p.last_name) LIKE ?{n} ESCAPE '\\')"
        ));
    }
    if let Some(unit) = query.unit.as_deref().filter(|u| !u.trim().is_empty()) {
        values.push(Value::Text(unit.trim().to_string()));
        clauses.push(format!("v.unit = ?{} COLLATE NOCASE", values.len()));
    }
    if let Some(after) = query.entered_after {
        values.push(Value::Text(to_iso8601(after)));
        clauses.push(format!("v.entry_time >= ?{}", values.len()));
    }
    if let Some(before) = query.entered_before {
        values.push(Value::Text(to_iso8601(before)));
        clauses.push(format!("v.entry_time < ?{}", values.len()));
    }

    values.push(Value::Integer(i64::from(query.effective_limit())));
    let limit_idx = values.len();

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "{HISTORY_SELECT}{where_clause} ORDER BY v.entry_time DESC, v.id DESC LIMIT ?{limit_idx}"
    );
    query_history(conn, &sql, values)
}

fn query_history(
    conn: &Connection,
    sql: &str,
    values: Vec<Value>,
) -> Result<Vec<VisitHistoryRow>, StorageError> {
    let mut stmt = conn.prepare(sql).map_err(sqlite_err)?;
    let mut rows = stmt
        .query_map(params_from_iter(values), |row| {
            Ok(VisitHistoryRow {
                visit: map_visit(row)?,
                first_name: row.get(8)?,
                last_name: row.get(9)?,
                is_banned: row.get::<_, i64>(10)? != 0,
            })
        })
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sqlite_err)?;
    attach_dependents(conn, rows.iter_mut().map(|r| &mut r.visit))?;
    Ok(rows)
}

fn attach_dependents<'a, I>(conn: &Connection, visits: I) -> Result<(), StorageError>
where
    I: Iterator<Item = &'a mut Visit>,
{
    let mut visits: Vec<&mut Visit> = visits.collect();
    let ids: Vec<VisitId> = visits.iter().map(|v| v.id).collect();
    let mut by_visit = load_dependents(conn, &ids)?;
    for visit in visits.iter_mut() {
        visit.dependents = by_visit.remove(&visit.id).unwrap_or_default();
    }
    Ok(())
}

/// Batched lookup of dependents for a set of visits.
pub fn load_dependents(
    conn: &Connection,
    visit_ids: &[VisitId],
) -> Result<HashMap<VisitId, Vec<Dependent>>, StorageError> {
    let mut out: HashMap<VisitId, Vec<Dependent>> = HashMap::new();

    for chunk in visit_ids.chunks(DEPENDENT_BATCH) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "SELECT id, visit_id, full_name, age FROM dependents
             WHERE visit_id IN ({placeholders}) ORDER BY id"
        );
        let mut stmt = conn.prepare(&sql).map_err(sqlite_err)?;
        let rows = stmt
            .query_map(params_from_iter(chunk.iter()), |row| {
                Ok(Dependent {
                    id: row.get(0)?,
                    visit_id: row.get(1)?,
                    full_name: row.get(2)?,
                    age: row.get(3)?,
                })
            })
            .map_err(sqlite_err)?;
        for dependent in rows {
            let dependent = dependent.map_err(sqlite_err)?;
            out.entry(dependent.visit_id).or_default().push(dependent);
        }
    }

    Ok(out)
}

fn map_visit(row: &Row<'_>) -> rusqlite::Result<Visit> {
    Ok(Visit {
        id: row.get(0)?,
        visitor_id: row.get(1)?,
        entry_time: row.get(2)?,
        exit_time: row.get(3)?,
        unit: row.get(4)?,
        person_visited: row.get(5)?,
        purpose: row.get(6)?,
        notes: row.get(7)?,
        dependents: Vec::new(),
    })
}
