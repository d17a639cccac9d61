//! Backup configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for the daily snapshot and restore subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackupConfig {
    /// Snapshot directory. Default: `backups/` next to the database file.
    pub dir: Option<String>,
    /// Days a snapshot is kept before the prune sweep removes it. Default: 7.
    pub retention_days: Option<u32>,
    /// Restore attempts before startup halts. Default: 2.
    pub max_restore_attempts: Option<u32>,
}

impl BackupConfig {
    /// Returns the effective backup directory for the given database file.
    pub fn effective_dir(&self, db_path: &Path) -> PathBuf {
        match self.dir.as_deref() {
            Some(dir) => PathBuf::from(dir),
            None => db_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("backups"),
        }
    }

    /// Returns the effective retention window, defaulting to 7 days.
    pub fn effective_retention_days(&self) -> u32 {
        self.retention_days.unwrap_or(7)
    }

    /// Returns the effective restore attempt budget, defaulting to 2.
    pub fn effective_max_restore_attempts(&self) -> u32 {
        self.max_restore_attempts.unwrap_or(2)
    }
}
