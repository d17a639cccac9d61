//! Data-retention configuration for the compliance cleanup job.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RetentionConfig {
    /// Age in years after which visits are purged. Default: 2.
    pub retention_years: Option<u32>,
    /// Run the cleanup job as part of startup. Default: true.
    pub run_on_startup: Option<bool>,
}

impl RetentionConfig {
    pub fn effective_retention_years(&self) -> u32 {
        self.retention_years.unwrap_or(2)
    }

    pub fn effective_run_on_startup(&self) -> bool {
        self.run_on_startup.unwrap_or(true)
    }
}
