//! Startup recovery errors. The only fatal path in the maintenance core.

use std::path::PathBuf;

use super::error_code::{self, FrontdeskErrorCode};

/// Raised when the database file cannot be brought to a clean state.
/// Callers must halt startup instead of opening the file read/write.
#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error("Database {path} still corrupt after {attempts} restore attempt(s)")]
    Exhausted { path: PathBuf, attempts: u32 },
}

impl FrontdeskErrorCode for RecoveryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Exhausted { .. } => error_code::RECOVERY_EXHAUSTED,
        }
    }
}
