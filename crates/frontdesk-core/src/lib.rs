//! # frontdesk-core
//!
//! Foundation crate for the front-desk visitor tracker.
//! Defines domain types, storage traits, errors, config, the clock
//! abstraction and tracing setup. Every other crate in the workspace
//! depends on this.

pub mod clock;
pub mod config;
pub mod errors;
pub mod tracing;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::FrontdeskConfig;
pub use errors::error_code::FrontdeskErrorCode;
pub use errors::{ConfigError, StorageError};
pub use traits::ICleanupStorage;
