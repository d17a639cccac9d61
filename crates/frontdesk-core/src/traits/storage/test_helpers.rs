//! `CleanupStorageStub`: in-memory test double for `ICleanupStorage`.
//!
//! Lets tests drive the cleanup job through failures that are awkward to
//! provoke on a real database.

use std::sync::Mutex;

use crate::errors::StorageError;
use crate::types::NewAuditRecord;

use super::cleanup::{CleanupStep, ICleanupStorage};

/// In-memory stub implementation of `ICleanupStorage`.
///
/// Each delete step returns its configured count. `fail_at` makes one step
/// return an error; `fail_audit` makes the audit insert fail. Calls are
/// recorded in order so tests can assert sequencing.
pub struct CleanupStorageStub {
    dependents: u64,
    visits: u64,
    visitors: u64,
    fail_at: Option<CleanupStep>,
    fail_audit: bool,
    calls: Mutex<Vec<&'static str>>,
    audit: Mutex<Vec<NewAuditRecord>>,
}

impl CleanupStorageStub {
    /// Create a stub whose delete steps report the given counts.
    pub fn new(dependents: u64, visits: u64, visitors: u64) -> Self {
        Self {
            dependents,
            visits,
            visitors,
            fail_at: None,
            fail_audit: false,
            calls: Mutex::new(Vec::new()),
            audit: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_at(mut self, step: CleanupStep) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub fn failing_audit(mut self) -> Self {
        self.fail_audit = true;
        self
    }

    /// Names of the primitives called so far, in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Audit records successfully written.
    pub fn audit_records(&self) -> Vec<NewAuditRecord> {
        self.audit.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn step(&self, step: CleanupStep, count: u64) -> Result<u64, StorageError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(step.as_str());
        }
        if self.fail_at == Some(step) {
            return Err(StorageError::SqliteError {
                message: format!("injected failure deleting {}", step.as_str()),
            });
        }
        Ok(count)
    }
}

impl ICleanupStorage for CleanupStorageStub {
    fn delete_expired_dependents(&self, _cutoff: &str) -> Result<u64, StorageError> {
        self.step(CleanupStep::Dependents, self.dependents)
    }

    fn delete_expired_visits(&self, _cutoff: &str) -> Result<u64, StorageError> {
        self.step(CleanupStep::Visits, self.visits)
    }

    fn delete_orphan_visitors(&self) -> Result<u64, StorageError> {
        self.step(CleanupStep::Visitors, self.visitors)
    }

    fn insert_audit_record(&self, record: &NewAuditRecord) -> Result<(), StorageError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push("audit");
        }
        if self.fail_audit {
            return Err(StorageError::SqliteError {
                message: "injected audit failure".to_string(),
            });
        }
        if let Ok(mut audit) = self.audit.lock() {
            audit.push(record.clone());
        }
        Ok(())
    }
}
