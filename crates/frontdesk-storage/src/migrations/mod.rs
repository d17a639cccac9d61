//! Migration runner: `PRAGMA user_version` tracking, forward-only,
//! transactional per migration.

mod v001_initial;

use frontdesk_core::errors::StorageError;
use rusqlite::Connection;
use tracing::{debug, info, warn};

/// Highest schema version this build knows how to create.
pub const LATEST_VERSION: u32 = 1;

const MIGRATIONS: [(u32, &str, &str); 1] = [(1, "initial", v001_initial::MIGRATION_SQL)];

/// Get the current schema version via `PRAGMA user_version`.
pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::MigrationFailed {
            version: 0,
            message: e.to_string(),
        })
}

/// Run all pending migrations. Returns how many were applied.
pub fn run_migrations(conn: &Connection) -> Result<u32, StorageError> {
    let current = current_version(conn)?;
    if current >= LATEST_VERSION {
        debug!("database schema is up to date (v{current})");
        return Ok(0);
    }

    info!("running migrations: v{} → v{}", current, LATEST_VERSION);
    let mut applied = 0;

    for &(version, name, sql) in &MIGRATIONS {
        if version <= current {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::MigrationFailed {
                version,
                message: format!("begin: {e}"),
            })?;

        let result = tx
            .execute_batch(sql)
            .and_then(|()| tx.pragma_update(None, "user_version", version));

        match result {
            Ok(()) => {
                tx.commit().map_err(|e| StorageError::MigrationFailed {
                    version,
                    message: format!("commit: {e}"),
                })?;
                info!("applied migration v{version:03}: {name}");
                applied += 1;
            }
            Err(e) => {
                // Dropping `tx` rolls back.
                warn!("migration v{version:03} failed: {e}, rolling back");
                return Err(StorageError::MigrationFailed {
                    version,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(applied)
}
