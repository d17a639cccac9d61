//! Compliance retention cleanup for the visitor database.
//!
//! Three bulk deletes in dependency order (dependents, visits, orphaned
//! visitors), then exactly one audit record describing the run. The steps
//! are not wrapped in a shared transaction: if a later step fails, rows
//! removed by earlier steps stay removed and the audit record carries their
//! counts. Banned visitors are never deleted here, but their old visits are.

use std::time::Instant;

use chrono::{DateTime, Months, Utc};
use frontdesk_core::clock::{to_iso8601, Clock};
use frontdesk_core::errors::StorageError;
use frontdesk_core::traits::{CleanupStep, ICleanupStorage};
use frontdesk_core::types::audit::{CLEANUP_FAILED, CLEANUP_SUCCEEDED};
use frontdesk_core::types::{AuditStatus, NewAuditRecord};
use frontdesk_core::FrontdeskErrorCode;
use serde::Serialize;
use tracing::{error, info, warn};

/// Outcome of one cleanup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub cutoff: String,
    pub status: AuditStatus,
    pub dependents_deleted: u64,
    pub visits_deleted: u64,
    pub profiles_deleted: u64,
    /// Step that failed, if any. Steps after it did not run.
    pub failed_step: Option<&'static str>,
    pub error: Option<String>,
    /// False when the audit insert itself failed.
    pub audit_written: bool,
    pub duration_ms: u64,
}

impl CleanupReport {
    pub fn succeeded(&self) -> bool {
        self.status == AuditStatus::Ok
    }

    pub fn event_name(&self) -> &'static str {
        match self.status {
            AuditStatus::Ok => CLEANUP_SUCCEEDED,
            AuditStatus::Error => CLEANUP_FAILED,
        }
    }

    fn audit_record(&self, timestamp: String) -> NewAuditRecord {
        NewAuditRecord {
            event_name: self.event_name().to_string(),
            timestamp,
            status: self.status,
            profiles_deleted: self.profiles_deleted,
            visits_deleted: self.visits_deleted,
            dependents_deleted: self.dependents_deleted,
        }
    }
}

/// `now` minus `retention_years`, in stored timestamp form.
/// Month arithmetic clamps Feb 29 to Feb 28.
pub fn retention_cutoff(now: DateTime<Utc>, retention_years: u32) -> String {
    let cutoff = now
        .checked_sub_months(Months::new(retention_years.saturating_mul(12)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    to_iso8601(cutoff)
}

/// Run the cleanup job once. Never fails: delete errors are recorded in the
/// audit log, and an audit write failure is logged as fatal.
pub fn run_compliance_cleanup<S>(
    storage: &S,
    clock: &dyn Clock,
    retention_years: u32,
) -> CleanupReport
where
    S: ICleanupStorage + ?Sized,
{
    let start = Instant::now();
    let cutoff = retention_cutoff(clock.now(), retention_years);
    info!(cutoff = %cutoff, retention_years, "compliance cleanup starting");

    let mut report = CleanupReport {
        cutoff: cutoff.clone(),
        status: AuditStatus::Ok,
        dependents_deleted: 0,
        visits_deleted: 0,
        profiles_deleted: 0,
        failed_step: None,
        error: None,
        audit_written: false,
        duration_ms: 0,
    };

    if let Err((step, e)) = delete_in_order(storage, &cutoff, &mut report) {
        warn!(
            step = step.as_str(),
            code = e.error_code(),
            error = %e,
            dependents_deleted = report.dependents_deleted,
            visits_deleted = report.visits_deleted,
            "compliance cleanup step failed, remaining steps skipped"
        );
        report.status = AuditStatus::Error;
        report.failed_step = Some(step.as_str());
        report.error = Some(e.to_string());
    }

    let record = report.audit_record(to_iso8601(clock.now()));
    match storage.insert_audit_record(&record) {
        Ok(()) => report.audit_written = true,
        Err(e) => {
            error!(
                fatal = true,
                code = e.error_code(),
                error = %e,
                event = record.event_name.as_str(),
                "failed to write compliance cleanup audit record"
            );
        }
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        status = report.status.as_str(),
        dependents_deleted = report.dependents_deleted,
        visits_deleted = report.visits_deleted,
        profiles_deleted = report.profiles_deleted,
        duration_ms = report.duration_ms,
        "compliance cleanup finished"
    );
    report
}

fn delete_in_order<S>(
    storage: &S,
    cutoff: &str,
    report: &mut CleanupReport,
) -> Result<(), (CleanupStep, StorageError)>
where
    S: ICleanupStorage + ?Sized,
{
    report.dependents_deleted = storage
        .delete_expired_dependents(cutoff)
        .map_err(|e| (CleanupStep::Dependents, e))?;
    report.visits_deleted = storage
        .delete_expired_visits(cutoff)
        .map_err(|e| (CleanupStep::Visits, e))?;
    report.profiles_deleted = storage
        .delete_orphan_visitors()
        .map_err(|e| (CleanupStep::Visitors, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use frontdesk_core::traits::storage::test_helpers::CleanupStorageStub;
    use frontdesk_core::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap())
    }

    #[test]
    fn cutoff_is_two_years_back() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(retention_cutoff(now, 2), "2023-06-15T12:00:00.000Z");
        let leap = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        assert_eq!(retention_cutoff(leap, 2), "2022-02-28T00:00:00.000Z");
    }

    #[test]
    fn steps_run_in_dependency_order_then_audit() {
        let stub = CleanupStorageStub::new(4, 3, 2);
        let report = run_compliance_cleanup(&stub, &clock(), 2);

        assert_eq!(stub.calls(), ["dependents", "visits", "visitors", "audit"]);
        assert!(report.succeeded());
        assert!(report.audit_written);

        let records = stub.audit_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_name, "Compliance Cleanup Succeeded");
        assert_eq!(records[0].status, AuditStatus::Ok);
        assert_eq!(records[0].dependents_deleted, 4);
        assert_eq!(records[0].visits_deleted, 3);
        assert_eq!(records[0].profiles_deleted, 2);
        assert_eq!(records[0].timestamp, "2025-06-15T12:00:00.000Z");
    }

    #[test]
    fn failure_at_visits_keeps_partial_counts() {
        let stub = CleanupStorageStub::new(5, 9, 9).failing_at(CleanupStep::Visits);
        let report = run_compliance_cleanup(&stub, &clock(), 2);

        assert_eq!(stub.calls(), ["dependents", "visits", "audit"]);
        assert_eq!(report.status, AuditStatus::Error);
        assert_eq!(report.failed_step, Some("visits"));

        let records = stub.audit_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_name, "Compliance Cleanup Failed");
        assert_eq!(records[0].status, AuditStatus::Error);
        assert_eq!(records[0].dependents_deleted, 5);
        assert_eq!(records[0].visits_deleted, 0);
        assert_eq!(records[0].profiles_deleted, 0);
    }

    #[test]
    fn failure_at_first_step_still_audits() {
        let stub = CleanupStorageStub::new(5, 9, 9).failing_at(CleanupStep::Dependents);
        let report = run_compliance_cleanup(&stub, &clock(), 2);
        assert_eq!(stub.calls(), ["dependents", "audit"]);
        assert_eq!(report.dependents_deleted, 0);
        assert_eq!(stub.audit_records().len(), 1);
    }

    #[test]
    fn audit_failure_does_not_propagate() {
        let stub = CleanupStorageStub::new(1, 1, 1).failing_audit();
        let report = run_compliance_cleanup(&stub, &clock(), 2);
        assert!(report.succeeded());
        assert!(!report.audit_written);
        assert!(stub.audit_records().is_empty());
    }

    #[test]
    fn works_through_trait_object() {
        let stub = CleanupStorageStub::new(0, 0, 0);
        let dyn_store: &dyn ICleanupStorage = &stub;
        let report = run_compliance_cleanup(dyn_store, &clock(), 2);
        assert!(report.succeeded());
        assert_eq!(report.event_name(), CLEANUP_SUCCEEDED);
    }
}
