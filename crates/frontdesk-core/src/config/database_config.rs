//! Database configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the primary database file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the primary database file. Default: `data/visitors.db`.
    pub path: Option<String>,
    /// SQLite busy timeout in milliseconds. Default: 5000.
    pub busy_timeout_ms: Option<u32>,
}

impl DatabaseConfig {
    /// Returns the effective database path, defaulting to `data/visitors.db`.
    pub fn effective_path(&self) -> PathBuf {
        PathBuf::from(self.path.as_deref().unwrap_or("data/visitors.db"))
    }

    /// Returns the effective busy timeout, defaulting to 5000ms.
    pub fn effective_busy_timeout_ms(&self) -> u32 {
        self.busy_timeout_ms.unwrap_or(5000)
    }
}
