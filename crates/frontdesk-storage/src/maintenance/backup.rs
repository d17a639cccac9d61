//! Dated daily snapshots of the primary database file.
//!
//! A snapshot is named `<stem>-<YYYY-MM-DD>.<ext>` and lives in a flat
//! backup directory. At most one is taken per calendar day (UTC). Every
//! successful call ends with a prune sweep that deletes snapshots whose
//! modification time is older than the retention window.
//!
//! Snapshots are taken with the SQLite Backup API, so commits still sitting
//! in the WAL are included and readers are never blocked.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, NaiveDate, Utc};
use frontdesk_core::config::BackupConfig;
use frontdesk_core::errors::StorageError;
use rusqlite::backup::Backup;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::connection::sqlite_err;

/// Result of a `create_daily_backup` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// A new snapshot was written.
    Created(PathBuf),
    /// Today's snapshot already existed; nothing was copied.
    AlreadyPresent(PathBuf),
    /// The copy failed. Logged; older snapshots were left alone.
    Failed,
}

impl BackupOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, Self::Failed)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Created(p) | Self::AlreadyPresent(p) => Some(p),
            Self::Failed => None,
        }
    }
}

/// What a prune sweep did. Failures are counted, never raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub deleted: Vec<PathBuf>,
    pub kept: usize,
    pub failures: usize,
}

/// Snapshot naming for one primary database file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SnapshotPattern {
    prefix: String,
    suffix: String,
}

impl SnapshotPattern {
    pub(crate) fn for_db(db_path: &Path) -> Option<Self> {
        let stem = db_path.file_stem()?.to_str()?;
        let suffix = match db_path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!(".{ext}"),
            None => String::new(),
        };
        Some(Self {
            prefix: format!("{stem}-"),
            suffix,
        })
    }

    pub(crate) fn file_name(&self, date: NaiveDate) -> String {
        format!("{}{}{}", self.prefix, date.format("%Y-%m-%d"), self.suffix)
    }

    pub(crate) fn matches(&self, name: &str) -> bool {
        name.len() > self.prefix.len() + self.suffix.len()
            && name.starts_with(&self.prefix)
            && name.ends_with(&self.suffix)
    }
}

/// `<stem>-<YYYY-MM-DD>.<ext>` for the given database path and day.
pub fn backup_file_name(db_path: &Path, date: NaiveDate) -> Option<String> {
    SnapshotPattern::for_db(db_path).map(|p| p.file_name(date))
}

/// Manages the snapshot directory of one deployment.
#[derive(Debug, Clone)]
pub struct BackupStore {
    backup_dir: PathBuf,
    retention_days: u32,
}

impl BackupStore {
    pub fn new(backup_dir: impl Into<PathBuf>, retention_days: u32) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            retention_days,
        }
    }

    pub fn from_config(config: &BackupConfig, db_path: &Path) -> Self {
        Self::new(
            config.effective_dir(db_path),
            config.effective_retention_days(),
        )
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Take today's snapshot of `db_path` unless it already exists, then prune.
    ///
    /// Never fails. A failed copy is logged and reported as
    /// [`BackupOutcome::Failed`]; the prune sweep is skipped in that case so a
    /// broken backup run cannot eat into the remaining snapshots.
    pub fn create_daily_backup(&self, db_path: &Path, now: DateTime<Utc>) -> BackupOutcome {
        let Some(pattern) = SnapshotPattern::for_db(db_path) else {
            error!(path = %db_path.display(), "database path has no usable file name");
            return BackupOutcome::Failed;
        };
        let target = self.backup_dir.join(pattern.file_name(now.date_naive()));

        let outcome = if target.exists() {
            debug!(backup = %target.display(), "daily backup already present");
            BackupOutcome::AlreadyPresent(target)
        } else {
            match self.write_snapshot(db_path, &target) {
                Ok(()) => {
                    info!(source = %db_path.display(), backup = %target.display(), "daily backup created");
                    BackupOutcome::Created(target)
                }
                Err(e) => {
                    error!(source = %db_path.display(), error = %e, "daily backup failed");
                    return BackupOutcome::Failed;
                }
            }
        };

        let report = prune_old_backups(&self.backup_dir, &pattern, self.retention_days, now.into());
        if !report.deleted.is_empty() || report.failures > 0 {
            info!(
                deleted = report.deleted.len(),
                kept = report.kept,
                failures = report.failures,
                "backup prune sweep finished"
            );
        }
        outcome
    }

    /// Run only the prune sweep for `db_path`'s snapshots.
    pub fn prune(&self, db_path: &Path, now: DateTime<Utc>) -> PruneReport {
        match SnapshotPattern::for_db(db_path) {
            Some(pattern) => {
                prune_old_backups(&self.backup_dir, &pattern, self.retention_days, now.into())
            }
            None => PruneReport::default(),
        }
    }

    /// Snapshots of `db_path`, newest first.
    pub fn list_snapshots(&self, db_path: &Path) -> Vec<PathBuf> {
        list_snapshots(&self.backup_dir, db_path)
    }

    fn write_snapshot(&self, source: &Path, target: &Path) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.backup_dir)?;

        // Copy into a side file and rename, so a half-written snapshot never
        // carries today's name.
        let mut partial = target.as_os_str().to_owned();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        if let Err(e) = copy_database(source, &partial) {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }
        std::fs::rename(&partial, target)?;
        Ok(())
    }
}

/// Copy a live database into `dest` with the SQLite Backup API.
///
/// The copy is switched to a rollback journal. A snapshot left in WAL mode
/// would grow `-wal`/`-shm` files in the backup directory on every
/// read-only open, and those never match the snapshot pattern.
pub(crate) fn copy_database(source: &Path, dest: &Path) -> Result<(), StorageError> {
    let src_conn =
        Connection::open_with_flags(source, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(sqlite_err)?;
    let mut dst_conn = Connection::open(dest).map_err(sqlite_err)?;

    {
        let backup = Backup::new(&src_conn, &mut dst_conn).map_err(sqlite_err)?;
        backup
            .run_to_completion(1000, Duration::from_millis(10), None)
            .map_err(sqlite_err)?;
    }
    dst_conn
        .pragma_update_and_check(None, "journal_mode", "DELETE", |row| row.get::<_, String>(0))
        .map_err(sqlite_err)?;

    dst_conn.close().map_err(|(_, e)| sqlite_err(e))?;
    Ok(())
}

/// Snapshots of `db_path` in `backup_dir`, ordered by name descending.
/// The date in the name makes that newest first. Missing directory means none.
pub fn list_snapshots(backup_dir: &Path, db_path: &Path) -> Vec<PathBuf> {
    let Some(pattern) = SnapshotPattern::for_db(db_path) else {
        return Vec::new();
    };
    let entries = match std::fs::read_dir(backup_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| pattern.matches(name))
        .collect();
    names.sort_unstable_by(|a, b| b.cmp(a));
    names.into_iter().map(|n| backup_dir.join(n)).collect()
}

/// Delete matching snapshots whose mtime is older than `retention_days`
/// before `now`. Per-file failures are logged and the sweep continues.
pub(crate) fn prune_old_backups(
    backup_dir: &Path,
    pattern: &SnapshotPattern,
    retention_days: u32,
    now: SystemTime,
) -> PruneReport {
    let mut report = PruneReport::default();
    let window = Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60);
    let Some(cutoff) = now.checked_sub(window) else {
        return report;
    };

    let entries = match std::fs::read_dir(backup_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %backup_dir.display(), error = %e, "cannot list backup directory");
            return report;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "cannot read backup directory entry");
                report.failures += 1;
                continue;
            }
        };
        let matches = entry
            .file_name()
            .to_str()
            .map(|name| pattern.matches(name))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        let path = entry.path();
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                warn!(backup = %path.display(), error = %e, "cannot stat backup");
                report.failures += 1;
                continue;
            }
        };

        if modified >= cutoff {
            report.kept += 1;
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(backup = %path.display(), "pruned expired backup");
                remove_sidecars(&path);
                report.deleted.push(path);
            }
            Err(e) => {
                warn!(backup = %path.display(), error = %e, "failed to prune backup");
                report.failures += 1;
            }
        }
    }
    report
}

/// Delete the `-wal`/`-shm` files next to `db_path`, if any.
pub(crate) fn remove_sidecars(db_path: &Path) {
    for suffix in ["-wal", "-shm"] {
        let sidecar = with_suffix(db_path, suffix);
        match std::fs::remove_file(&sidecar) {
            Ok(()) => debug!(path = %sidecar.display(), "removed journal file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %sidecar.display(), error = %e, "failed to remove journal file"),
        }
    }
}

pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}
