//! Configuration system for the front-desk tracker.
//! TOML-based, layered resolution: CLI > env > project file > defaults.

pub mod backup_config;
pub mod database_config;
pub mod frontdesk_config;
pub mod retention_config;

pub use backup_config::BackupConfig;
pub use database_config::DatabaseConfig;
pub use frontdesk_config::{CliOverrides, FrontdeskConfig};
pub use retention_config::RetentionConfig;
