//! `frontdesk`: maintenance entry point for the visitor database.
//!
//! Meant to be run by an operator or an external scheduler (cron, systemd
//! timer). Every command resolves configuration the same way:
//! flags > `FRONTDESK_*` environment > `frontdesk.toml` > defaults.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use frontdesk_core::config::CliOverrides;
use frontdesk_core::errors::error_code;
use frontdesk_core::tracing::init_tracing;
use frontdesk_core::{Clock, ConfigError, FrontdeskConfig, FrontdeskErrorCode, StorageError, SystemClock};
use frontdesk_storage::maintenance::integrity::inspect_integrity;
use frontdesk_storage::queries::audit;
use frontdesk_storage::{
    restore_from_backup, run_compliance_cleanup, startup, BackupStore, FrontdeskStorage,
    RestoreOutcome, StartupError,
};
use tracing::{error, info};

/// Front-desk visitor database maintenance
#[derive(Parser, Debug)]
#[command(name = "frontdesk", version, about)]
struct Cli {
    /// Path to a TOML config file (default: ./frontdesk.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overrides config
    #[arg(long)]
    db: Option<String>,

    /// Backup directory, overrides config
    #[arg(long)]
    backup_dir: Option<String>,

    /// Visit retention in years, overrides config
    #[arg(long)]
    retention_years: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Verify or recover the database, back it up and run cleanup
    Startup,
    /// Run the integrity check (exit 1 when not clean)
    Check,
    /// Take today's backup if missing and prune old ones
    Backup,
    /// Copy the newest backup over the database file. Stop the service first.
    Restore,
    /// Run the retention cleanup job once
    Cleanup,
    /// Print the newest audit records as JSON lines
    Audit {
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("Cannot encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot determine working directory: {0}")]
    WorkingDir(std::io::Error),
}

impl FrontdeskErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Startup(e) => e.error_code(),
            Self::Json(_) | Self::WorkingDir(_) => error_code::IO_ERROR,
        }
    }
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Startup(StartupError::Recovery(_)) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli, &SystemClock) {
        Ok(code) => code,
        Err(e) => {
            error!(code = e.error_code(), error = %e, "command failed");
            eprintln!("{}", e.coded_string());
            e.exit_code()
        }
    }
}

fn load_config(cli: &Cli) -> Result<FrontdeskConfig, CliError> {
    let overrides = CliOverrides {
        db_path: cli.db.clone(),
        backup_dir: cli.backup_dir.clone(),
        retention_years: cli.retention_years,
    };
    let config = match &cli.config {
        Some(path) => FrontdeskConfig::load_from_file(path, Some(&overrides))?,
        None => {
            let cwd = std::env::current_dir().map_err(CliError::WorkingDir)?;
            FrontdeskConfig::load(&cwd, Some(&overrides))?
        }
    };
    Ok(config)
}

fn run(cli: &Cli, clock: &dyn Clock) -> Result<ExitCode, CliError> {
    let config = load_config(cli)?;
    let db_path = config.database.effective_path();

    match &cli.command {
        Command::Startup => {
            let outcome = startup(&config, clock)?;
            println!("{}", serde_json::to_string_pretty(&outcome.status.snapshot())?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => {
            let status = inspect_integrity(&db_path);
            println!("{}", serde_json::to_string(&status)?);
            Ok(if status.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Backup => {
            let store = BackupStore::from_config(&config.backup, &db_path);
            let outcome = store.create_daily_backup(&db_path, clock.now());
            match outcome.path() {
                Some(path) => {
                    println!("{}", path.display());
                    Ok(ExitCode::SUCCESS)
                }
                None => Ok(ExitCode::FAILURE),
            }
        }
        Command::Restore => {
            let backup_dir = config.backup.effective_dir(&db_path);
            match restore_from_backup(&backup_dir, &db_path) {
                RestoreOutcome::Restored(from) => {
                    info!(backup = %from.display(), "restore complete");
                    println!("{}", from.display());
                    Ok(ExitCode::SUCCESS)
                }
                RestoreOutcome::NoBackups | RestoreOutcome::CopyFailed => Ok(ExitCode::FAILURE),
            }
        }
        Command::Cleanup => {
            let storage =
                FrontdeskStorage::open(&db_path, config.database.effective_busy_timeout_ms())?;
            let report = run_compliance_cleanup(
                &storage,
                clock,
                config.retention.effective_retention_years(),
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.succeeded() && report.audit_written {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Audit { limit } => {
            let storage =
                FrontdeskStorage::open(&db_path, config.database.effective_busy_timeout_ms())?;
            let records = storage.with_conn(|conn| audit::list_audit_records(conn, *limit))?;
            for record in records {
                println!("{}", serde_json::to_string(&record)?);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_and_audit_limit() {
        let cli = Cli::try_parse_from([
            "frontdesk",
            "--db",
            "/tmp/v.db",
            "--retention-years",
            "3",
            "audit",
            "--limit",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.db.as_deref(), Some("/tmp/v.db"));
        assert_eq!(cli.retention_years, Some(3));
        assert_eq!(cli.command, Command::Audit { limit: 5 });
    }

    #[test]
    fn audit_limit_defaults_to_twenty() {
        let cli = Cli::try_parse_from(["frontdesk", "audit"]).unwrap();
        assert_eq!(cli.command, Command::Audit { limit: 20 });
    }

    #[test]
    fn recovery_failure_maps_to_exit_code_two() {
        let err = CliError::from(StartupError::from(
            frontdesk_core::errors::RecoveryError::Exhausted {
                path: PathBuf::from("v.db"),
                attempts: 2,
            },
        ));
        assert_eq!(err.exit_code(), ExitCode::from(2));
        assert_eq!(err.error_code(), "RECOVERY_EXHAUSTED");
        assert!(err.coded_string().starts_with("[RECOVERY_EXHAUSTED] "));
    }

    #[test]
    fn check_on_missing_file_fails() {
        let dir = std::env::temp_dir().join("frontdesk-cli-check-missing");
        let db = dir.join("absent.db");
        let cli = Cli::try_parse_from([
            "frontdesk",
            "--db",
            db.to_str().unwrap(),
            "check",
        ])
        .unwrap();
        let code = run(&cli, &SystemClock).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }
}
