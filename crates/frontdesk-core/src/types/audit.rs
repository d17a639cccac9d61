//! Audit log records. Append-only: never updated or deleted by this crate.

use serde::{Deserialize, Serialize};

pub const CLEANUP_SUCCEEDED: &str = "Compliance Cleanup Succeeded";
pub const CLEANUP_FAILED: &str = "Compliance Cleanup Failed";
pub const CLIENT_ERROR: &str = "Client Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Ok,
    Error,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
        }
    }

    /// Unknown values read back as `Error`.
    pub fn parse(s: &str) -> Self {
        match s {
            "OK" => Self::Ok,
            _ => Self::Error,
        }
    }
}

/// A stored audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub event_name: String,
    pub timestamp: String,
    pub status: AuditStatus,
    pub profiles_deleted: u64,
    pub visits_deleted: u64,
    pub dependents_deleted: u64,
}

/// An audit row about to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditRecord {
    pub event_name: String,
    pub timestamp: String,
    pub status: AuditStatus,
    pub profiles_deleted: u64,
    pub visits_deleted: u64,
    pub dependents_deleted: u64,
}
