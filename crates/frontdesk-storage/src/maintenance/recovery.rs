//! Startup recovery: make sure the primary file is clean before anything
//! opens it read/write.
//!
//! Check, and on failure restore from the backup directory and re-check,
//! up to a bounded number of attempts. Attempt `n` restores the `n`-th
//! newest snapshot (falling back to the oldest), so one bad snapshot does
//! not burn the whole budget.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use frontdesk_core::errors::RecoveryError;
use frontdesk_core::Clock;
use tracing::{error, info, warn};

use super::backup::{list_snapshots, remove_sidecars, with_suffix};
use super::integrity::check_integrity;

/// Result of a single restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The snapshot at this path was copied over the primary file.
    Restored(PathBuf),
    /// The backup directory is missing or holds no matching snapshot.
    NoBackups,
    /// A snapshot was selected but copying it failed.
    CopyFailed,
}

/// How the primary file ended up clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Passed the first check; nothing touched.
    Healthy,
    /// Restored from `from` on attempt `attempts`.
    Restored { from: PathBuf, attempts: u32 },
    /// No snapshot to restore from. The caller creates a new, empty
    /// database. Any corrupt file was moved aside first.
    FreshStart { quarantined: Option<PathBuf> },
}

/// Copy the newest snapshot of `db_path` over it.
pub fn restore_from_backup(backup_dir: &Path, db_path: &Path) -> RestoreOutcome {
    restore_nth(backup_dir, db_path, 0)
}

/// Copy the `skip`-th newest snapshot (or the oldest when there are fewer)
/// over `db_path`. Stale `-wal`/`-shm` sidecars are removed afterwards so the
/// engine cannot replay a journal that belongs to the corrupt file.
pub fn restore_nth(backup_dir: &Path, db_path: &Path, skip: usize) -> RestoreOutcome {
    let snapshots = list_snapshots(backup_dir, db_path);
    let Some(source) = snapshots.get(skip).or_else(|| snapshots.last()) else {
        warn!(dir = %backup_dir.display(), "no backups available to restore from");
        return RestoreOutcome::NoBackups;
    };

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            error!(dir = %parent.display(), error = %e, "cannot create database directory");
            return RestoreOutcome::CopyFailed;
        }
    }

    match std::fs::copy(source, db_path) {
        Ok(_) => {
            remove_sidecars(db_path);
            info!(backup = %source.display(), path = %db_path.display(), "database restored from backup");
            RestoreOutcome::Restored(source.clone())
        }
        Err(e) => {
            error!(backup = %source.display(), error = %e, "restore copy failed");
            RestoreOutcome::CopyFailed
        }
    }
}

/// Bring `db_path` to a state that passes the integrity check.
///
/// Returns `Err(RecoveryError::Exhausted)` once `max_attempts` restores
/// have been tried and the file is still not clean. That is the only fatal
/// outcome; the caller must halt instead of opening the file.
pub fn ensure_healthy_database(
    db_path: &Path,
    backup_dir: &Path,
    max_attempts: u32,
    clock: &dyn Clock,
) -> Result<RecoveryOutcome, RecoveryError> {
    if check_integrity(db_path) {
        return Ok(RecoveryOutcome::Healthy);
    }
    warn!(path = %db_path.display(), "database failed integrity check, attempting restore");

    for attempt in 1..=max_attempts {
        let skip = (attempt - 1) as usize;
        match restore_nth(backup_dir, db_path, skip) {
            RestoreOutcome::NoBackups => {
                let quarantined = quarantine(db_path, clock.now());
                warn!(path = %db_path.display(), "no backups, starting with a fresh database");
                return Ok(RecoveryOutcome::FreshStart { quarantined });
            }
            RestoreOutcome::Restored(from) => {
                if check_integrity(db_path) {
                    info!(attempt, backup = %from.display(), "database recovered");
                    return Ok(RecoveryOutcome::Restored {
                        from,
                        attempts: attempt,
                    });
                }
                warn!(attempt, backup = %from.display(), "restored database still fails integrity check");
            }
            RestoreOutcome::CopyFailed => {
                warn!(attempt, "restore attempt could not copy a backup");
            }
        }
    }

    error!(
        fatal = true,
        path = %db_path.display(),
        attempts = max_attempts,
        "database could not be recovered from backups, halting"
    );
    Err(RecoveryError::Exhausted {
        path: db_path.to_path_buf(),
        attempts: max_attempts,
    })
}

/// Move a corrupt primary file out of the way as
/// `<name>.corrupt-<unix-seconds>` and drop its journal files. Returns the
/// new path, or `None` when there was no file or the rename failed.
fn quarantine(db_path: &Path, now: DateTime<Utc>) -> Option<PathBuf> {
    if !db_path.exists() {
        return None;
    }
    let target = with_suffix(db_path, &format!(".corrupt-{}", now.timestamp()));

    match std::fs::rename(db_path, &target) {
        Ok(()) => {
            remove_sidecars(db_path);
            warn!(from = %db_path.display(), to = %target.display(), "corrupt database moved aside");
            Some(target)
        }
        Err(e) => {
            error!(path = %db_path.display(), error = %e, "failed to move corrupt database aside");
            None
        }
    }
}
