//! Error handling for the front-desk tracker.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod error_code;
pub mod recovery_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use error_code::FrontdeskErrorCode;
pub use recovery_error::RecoveryError;
pub use storage_error::StorageError;
