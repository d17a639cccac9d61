//! # frontdesk-storage
//!
//! SQLite persistence layer for the front-desk visitor tracker.
//! One read/write connection (WAL mode), forward-only migrations,
//! visitor/visit CRUD, and the maintenance pipeline that guards the
//! database file: integrity check, daily backups, startup recovery and
//! the compliance retention cleanup with its audit trail.

pub mod connection;
pub mod maintenance;
pub mod migrations;
pub mod queries;
pub mod retention;
pub mod startup;
pub mod storage;

pub use maintenance::backup::{BackupOutcome, BackupStore};
pub use maintenance::integrity::check_integrity;
pub use maintenance::recovery::{
    ensure_healthy_database, restore_from_backup, RecoveryOutcome, RestoreOutcome,
};
pub use retention::{run_compliance_cleanup, CleanupReport};
pub use startup::{
    startup, DatabaseHealth, DatabaseStatus, StartupError, StartupOutcome, StatusSnapshot,
};
pub use storage::FrontdeskStorage;
