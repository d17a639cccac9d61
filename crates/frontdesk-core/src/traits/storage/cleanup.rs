//! `ICleanupStorage` trait: the primitives behind the retention cleanup job.

use std::sync::Arc;

use crate::errors::StorageError;
use crate::types::NewAuditRecord;

/// The three delete steps of a cleanup run, in the order they must execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStep {
    Dependents,
    Visits,
    Visitors,
}

impl CleanupStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dependents => "dependents",
            Self::Visits => "visits",
            Self::Visitors => "visitors",
        }
    }
}

/// Bulk-delete primitives. Each call is one statement and returns the number
/// of rows it removed. `cutoff` is an ISO-8601 UTC timestamp compared as text.
pub trait ICleanupStorage: Send + Sync {
    /// Delete dependents whose parent visit entered before `cutoff`.
    fn delete_expired_dependents(&self, cutoff: &str) -> Result<u64, StorageError>;

    /// Delete visits that entered before `cutoff`, signed out or not.
    fn delete_expired_visits(&self, cutoff: &str) -> Result<u64, StorageError>;

    /// Delete unbanned visitors with no remaining visits.
    fn delete_orphan_visitors(&self) -> Result<u64, StorageError>;

    /// Append one audit record.
    fn insert_audit_record(&self, record: &NewAuditRecord) -> Result<(), StorageError>;
}

// ─── Arc blanket impl ───────────────────────────────────────────────

impl<T: ICleanupStorage + ?Sized> ICleanupStorage for Arc<T> {
    fn delete_expired_dependents(&self, cutoff: &str) -> Result<u64, StorageError> {
        (**self).delete_expired_dependents(cutoff)
    }
    fn delete_expired_visits(&self, cutoff: &str) -> Result<u64, StorageError> {
        (**self).delete_expired_visits(cutoff)
    }
    fn delete_orphan_visitors(&self) -> Result<u64, StorageError> {
        (**self).delete_orphan_visitors()
    }
    fn insert_audit_record(&self, record: &NewAuditRecord) -> Result<(), StorageError> {
        (**self).insert_audit_record(record)
    }
}
