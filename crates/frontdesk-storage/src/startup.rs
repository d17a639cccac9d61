//! Process startup for the visitor database.
//!
//! Order matters: the file is verified (and restored if needed) before the
//! read/write connection exists, the daily snapshot is taken of the
//! now-healthy file, and only then does the retention job touch data.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use frontdesk_core::config::FrontdeskConfig;
use frontdesk_core::errors::error_code::{self, FrontdeskErrorCode};
use frontdesk_core::errors::{RecoveryError, StorageError};
use frontdesk_core::Clock;
use serde::Serialize;
use tracing::{error, info};

use crate::maintenance::backup::{BackupOutcome, BackupStore};
use crate::maintenance::recovery::{ensure_healthy_database, RecoveryOutcome};
use crate::retention::{run_compliance_cleanup, CleanupReport};
use crate::storage::FrontdeskStorage;

/// Health of the primary file as established at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseHealth {
    #[default]
    Unknown,
    Healthy,
    Restored,
    FreshStart,
    Corrupt,
}

impl From<&RecoveryOutcome> for DatabaseHealth {
    fn from(outcome: &RecoveryOutcome) -> Self {
        match outcome {
            RecoveryOutcome::Healthy => Self::Healthy,
            RecoveryOutcome::Restored { .. } => Self::Restored,
            RecoveryOutcome::FreshStart { .. } => Self::FreshStart,
        }
    }
}

/// Point-in-time copy of [`DatabaseStatus`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub health: DatabaseHealth,
    pub database_path: Option<PathBuf>,
    pub last_backup: Option<PathBuf>,
    pub last_cleanup: Option<CleanupReport>,
}

/// Shared, explicitly owned status of the database. Handed out as
/// `Arc<DatabaseStatus>` to whatever serves requests.
#[derive(Debug, Default)]
pub struct DatabaseStatus {
    inner: RwLock<StatusSnapshot>,
}

impl DatabaseStatus {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StatusSnapshot> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StatusSnapshot> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn health(&self) -> DatabaseHealth {
        self.read().health
    }

    pub fn set_health(&self, health: DatabaseHealth) {
        self.write().health = health;
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.read().database_path.clone()
    }

    pub fn set_database_path(&self, path: PathBuf) {
        self.write().database_path = Some(path);
    }

    pub fn last_backup(&self) -> Option<PathBuf> {
        self.read().last_backup.clone()
    }

    pub fn set_last_backup(&self, path: PathBuf) {
        self.write().last_backup = Some(path);
    }

    pub fn last_cleanup(&self) -> Option<CleanupReport> {
        self.read().last_cleanup.clone()
    }

    pub fn set_last_cleanup(&self, report: CleanupReport) {
        self.write().last_cleanup = Some(report);
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.read().clone()
    }
}

/// Errors that stop startup. The caller must not serve requests.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Cannot create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FrontdeskErrorCode for StartupError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Recovery(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::CreateDir { .. } => error_code::IO_ERROR,
        }
    }
}

/// Everything startup produced.
pub struct StartupOutcome {
    pub storage: FrontdeskStorage,
    pub status: Arc<DatabaseStatus>,
    pub recovery: RecoveryOutcome,
    pub backup: BackupOutcome,
}

/// Verify or recover the database, open it, snapshot it, and run the
/// retention job if configured.
pub fn startup(config: &FrontdeskConfig, clock: &dyn Clock) -> Result<StartupOutcome, StartupError> {
    let db_path = config.database.effective_path();
    let backups = BackupStore::from_config(&config.backup, &db_path);
    let status = Arc::new(DatabaseStatus::new());
    status.set_database_path(db_path.clone());

    let recovery = match ensure_healthy_database(
        &db_path,
        backups.backup_dir(),
        config.backup.effective_max_restore_attempts(),
        clock,
    ) {
        Ok(outcome) => outcome,
        Err(e) => {
            status.set_health(DatabaseHealth::Corrupt);
            error!(fatal = true, code = e.error_code(), error = %e, "startup halted");
            return Err(e.into());
        }
    };
    status.set_health(DatabaseHealth::from(&recovery));

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| StartupError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let storage = FrontdeskStorage::open(&db_path, config.database.effective_busy_timeout_ms())?;
    info!(path = %db_path.display(), health = ?status.health(), "database opened");

    let backup = backups.create_daily_backup(&db_path, clock.now());
    if let Some(path) = backup.path() {
        status.set_last_backup(path.to_path_buf());
    }

    if config.retention.effective_run_on_startup() {
        let report = run_compliance_cleanup(
            &storage,
            clock,
            config.retention.effective_retention_years(),
        );
        status.set_last_cleanup(report);
    }

    Ok(StartupOutcome {
        storage,
        status,
        recovery,
        backup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_unknown() {
        let status = DatabaseStatus::new();
        assert_eq!(status.health(), DatabaseHealth::Unknown);
        assert!(status.last_backup().is_none());
        assert!(status.last_cleanup().is_none());
    }

    #[test]
    fn status_setters_are_visible_through_arc() {
        let status = Arc::new(DatabaseStatus::new());
        let shared = Arc::clone(&status);
        shared.set_health(DatabaseHealth::Restored);
        shared.set_last_backup(PathBuf::from("backups/visitors-2025-01-01.db"));
        assert_eq!(status.health(), DatabaseHealth::Restored);
        assert_eq!(
            status.snapshot().last_backup,
            Some(PathBuf::from("backups/visitors-2025-01-01.db"))
        );
    }

    #[test]
    fn health_serializes_snake_case() {
        let json = serde_json::to_string(&DatabaseHealth::FreshStart).unwrap();
        assert_eq!(json, "\"fresh_start\"");
    }

    #[test]
    fn startup_error_codes_pass_through() {
        let err = StartupError::from(RecoveryError::Exhausted {
            path: PathBuf::from("x.db"),
            attempts: 2,
        });
        assert_eq!(err.error_code(), "RECOVERY_EXHAUSTED");
        let err = StartupError::from(StorageError::DbBusy);
        assert_eq!(err.error_code(), "DB_BUSY");
    }
}
