//! Top-level configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{BackupConfig, DatabaseConfig, RetentionConfig};
use crate::errors::ConfigError;

/// File name looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "frontdesk.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`FRONTDESK_*`)
/// 3. Project config (`frontdesk.toml`)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FrontdeskConfig {
    pub database: DatabaseConfig,
    pub backup: BackupConfig,
    pub retention: RetentionConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db_path: Option<String>,
    pub backup_dir: Option<String>,
    pub retention_years: Option<u32>,
}

impl FrontdeskConfig {
    /// Load configuration, reading `frontdesk.toml` from `root` when present.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join(CONFIG_FILE_NAME);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::finish(config, cli_overrides)
    }

    /// Load configuration from an explicit file. The file must exist.
    pub fn load_from_file(
        path: &Path,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        Self::merge_toml_file(&mut config, path)?;
        Self::finish(config, cli_overrides)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    fn finish(mut config: Self, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &FrontdeskConfig) -> Result<(), ConfigError> {
        if let Some(ref path) = config.database.path {
            if path.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "database.path".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        if config.backup.retention_days == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "backup.retention_days".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.backup.max_restore_attempts == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "backup.max_restore_attempts".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.retention.retention_years == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "retention.retention_years".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut FrontdeskConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: FrontdeskConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins only where it has a value.
    fn merge(base: &mut FrontdeskConfig, other: &FrontdeskConfig) {
        if other.database.path.is_some() {
            base.database.path = other.database.path.clone();
        }
        if other.database.busy_timeout_ms.is_some() {
            base.database.busy_timeout_ms = other.database.busy_timeout_ms;
        }

        if other.backup.dir.is_some() {
            base.backup.dir = other.backup.dir.clone();
        }
        if other.backup.retention_days.is_some() {
            base.backup.retention_days = other.backup.retention_days;
        }
        if other.backup.max_restore_attempts.is_some() {
            base.backup.max_restore_attempts = other.backup.max_restore_attempts;
        }

        if other.retention.retention_years.is_some() {
            base.retention.retention_years = other.retention.retention_years;
        }
        if other.retention.run_on_startup.is_some() {
            base.retention.run_on_startup = other.retention.run_on_startup;
        }
    }

    /// Apply `FRONTDESK_*` environment variables through `lookup`.
    pub fn apply_env_overrides<F>(config: &mut FrontdeskConfig, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("FRONTDESK_DB_PATH") {
            config.database.path = Some(path);
        }
        if let Some(dir) = lookup("FRONTDESK_BACKUP_DIR") {
            config.backup.dir = Some(dir);
        }
        if let Some(days) = lookup("FRONTDESK_BACKUP_RETENTION_DAYS") {
            config.backup.retention_days = Some(parse_env_u32("FRONTDESK_BACKUP_RETENTION_DAYS", &days)?);
        }
        if let Some(years) = lookup("FRONTDESK_RETENTION_YEARS") {
            config.retention.retention_years = Some(parse_env_u32("FRONTDESK_RETENTION_YEARS", &years)?);
        }
        Ok(())
    }

    pub fn apply_cli_overrides(config: &mut FrontdeskConfig, cli: &CliOverrides) {
        if let Some(ref path) = cli.db_path {
            config.database.path = Some(path.clone());
        }
        if let Some(ref dir) = cli.backup_dir {
            config.backup.dir = Some(dir.clone());
        }
        if let Some(years) = cli.retention_years {
            config.retention.retention_years = Some(years);
        }
    }

    /// Serialize back to TOML, e.g. for `frontdesk config` style output.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            field: "<root>".to_string(),
            message: e.to_string(),
        })
    }
}

fn parse_env_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: key.to_string(),
        message: format!("expected a non-negative integer, got '{value}'"),
    })
}
