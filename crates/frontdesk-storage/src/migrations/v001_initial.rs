//! V001: Initial schema: visitors, visits, dependents, audit log.

pub const MIGRATION_SQL: &str = r#"
-- Visitor profiles. Photos are stored outside the database; only the path lives here.
CREATE TABLE IF NOT EXISTS visitors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    photo_path TEXT,
    is_banned INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_visitors_name
    ON visitors(last_name COLLATE NOCASE, first_name COLLATE NOCASE);

-- One row per sign-in. exit_time stays NULL while the visitor is on site.
-- Timestamps are ISO-8601 UTC text so string comparison is chronological.
-- No ON DELETE CASCADE: the retention job deletes children explicitly.
CREATE TABLE IF NOT EXISTS visits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visitor_id INTEGER NOT NULL REFERENCES visitors(id),
    entry_time TEXT NOT NULL,
    exit_time TEXT,
    unit TEXT NOT NULL DEFAULT '',
    person_visited TEXT NOT NULL DEFAULT '',
    purpose TEXT,
    notes TEXT
) STRICT;

CREATE INDEX IF NOT EXISTS idx_visits_entry_time ON visits(entry_time);
CREATE INDEX IF NOT EXISTS idx_visits_visitor ON visits(visitor_id);
CREATE INDEX IF NOT EXISTS idx_visits_active ON visits(entry_time) WHERE exit_time IS NULL;

-- People accompanying a visitor on one visit.
CREATE TABLE IF NOT EXISTS dependents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visit_id INTEGER NOT NULL REFERENCES visits(id),
    full_name TEXT NOT NULL,
    age INTEGER
) STRICT;

CREATE INDEX IF NOT EXISTS idx_dependents_visit ON dependents(visit_id);

-- Append-only maintenance and client-error log.
CREATE TABLE IF NOT EXISTS audit_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_name TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('OK', 'ERROR')),
    profiles_deleted INTEGER NOT NULL DEFAULT 0,
    visits_deleted INTEGER NOT NULL DEFAULT 0,
    dependents_deleted INTEGER NOT NULL DEFAULT 0
) STRICT;

CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_logs(timestamp);
"#;
