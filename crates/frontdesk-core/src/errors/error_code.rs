//! `FrontdeskErrorCode` trait for stable, machine-readable error codes.

/// Every error enum implements this to provide a structured error code
/// string for log fields and CLI output.
pub trait FrontdeskErrorCode {
    /// Returns the error code string (e.g., "DB_CORRUPT").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DB_BUSY: &str = "DB_BUSY";
pub const DB_CORRUPT: &str = "DB_CORRUPT";
pub const DISK_FULL: &str = "DISK_FULL";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const VISITOR_BANNED: &str = "VISITOR_BANNED";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const RECOVERY_EXHAUSTED: &str = "RECOVERY_EXHAUSTED";
pub const IO_ERROR: &str = "IO_ERROR";
