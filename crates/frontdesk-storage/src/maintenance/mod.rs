//! Maintenance of the primary database file.
//!
//! ## Components
//! - **integrity**: read-only `PRAGMA integrity_check` of the file
//! - **backup**: dated daily snapshots with a retention-bounded prune sweep
//! - **recovery**: startup restore loop driving the two above

pub mod backup;
pub mod integrity;
pub mod recovery;

pub use backup::{BackupOutcome, BackupStore, PruneReport};
pub use integrity::{check_integrity, inspect_integrity, IntegrityStatus};
pub use recovery::{
    ensure_healthy_database, restore_from_backup, restore_nth, RecoveryOutcome, RestoreOutcome,
};
