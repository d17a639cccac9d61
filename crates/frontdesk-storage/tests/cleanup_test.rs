//! Retention cleanup against a real SQLite database.

use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use frontdesk_core::types::{AuditStatus, NewDependent, NewVisit, NewVisitor, VisitorId};
use frontdesk_core::FixedClock;
use frontdesk_storage::queries::{audit, visitors, visits};
use frontdesk_storage::{run_compliance_cleanup, FrontdeskStorage};
use proptest::prelude::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap()
}

fn add_visitor(storage: &FrontdeskStorage, first: &str, last: &str) -> VisitorId {
    storage
        .with_conn(|conn| {
            visitors::register_visitor(
                conn,
                &NewVisitor {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    photo_path: None,
                },
                now() - Duration::days(4 * 365),
            )
        })
        .unwrap()
}

fn add_visit(storage: &FrontdeskStorage, visitor_id: VisitorId, at: DateTime<Utc>, deps: &[&str]) -> i64 {
    let visit = NewVisit {
        visitor_id,
        unit: "4B".to_string(),
        person_visited: "Resident".to_string(),
        purpose: None,
        notes: None,
        dependents: deps
            .iter()
            .map(|name| NewDependent {
                full_name: name.to_string(),
                age: Some(7),
            })
            .collect(),
    };
    storage
        .with_conn(|conn| visits::sign_in(conn, &visit, at))
        .unwrap()
}

fn ban(storage: &FrontdeskStorage, visitor_id: VisitorId) {
    assert!(storage
        .with_conn(|conn| visitors::set_banned(conn, visitor_id, true))
        .unwrap());
}

fn count(storage: &FrontdeskStorage, table: &str) -> i64 {
    storage
        .with_conn(|conn| {
            Ok(conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
                .unwrap())
        })
        .unwrap()
}

#[test]
fn three_visitor_scenario() {
    let storage = FrontdeskStorage::open_in_memory().unwrap();
    let three_years_ago = now() - Duration::days(3 * 365);

    let expired = add_visitor(&storage, "Old", "Timer");
    add_visit(&storage, expired, three_years_ago, &["Kid Timer"]);

    let recent = add_visitor(&storage, "New", "Comer");
    add_visit(&storage, recent, now() - Duration::days(1), &[]);

    let banned = add_visitor(&storage, "Trouble", "Maker");
    add_visit(&storage, banned, three_years_ago, &[]);
    ban(&storage, banned);

    let clock = FixedClock::new(now());
    let report = run_compliance_cleanup(&storage, &clock, 2);
    assert!(report.succeeded());

    let remaining = storage
        .with_conn(|conn| {
            Ok((
                visitors::get_visitor(conn, expired)?,
                visitors::get_visitor(conn, recent)?,
                visitors::get_visitor(conn, banned)?,
                visits::visits_for_visitor(conn, banned)?,
            ))
        })
        .unwrap();
    assert!(remaining.0.is_none());
    assert!(remaining.1.is_some());
    assert!(remaining.2.is_some());
    assert!(remaining.3.is_empty());
    assert_eq!(count(&storage, "dependents"), 0);
    assert_eq!(count(&storage, "visits"), 1);

    let records = storage
        .with_conn(|conn| audit::list_audit_records(conn, 10))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_name, "Compliance Cleanup Succeeded");
    assert_eq!(records[0].status, AuditStatus::Ok);
    assert_eq!(records[0].profiles_deleted, 1);
    assert_eq!(records[0].visits_deleted, 2);
    assert_eq!(records[0].dependents_deleted, 1);
}

#[test]
fn second_run_is_an_ok_record_with_zero_counts() {
    let storage = FrontdeskStorage::open_in_memory().unwrap();
    let v = add_visitor(&storage, "Old", "Timer");
    add_visit(&storage, v, now() - Duration::days(1000), &["A", "B"]);

    let clock = FixedClock::new(now());
    let first = run_compliance_cleanup(&storage, &clock, 2);
    assert_eq!(first.dependents_deleted, 2);

    let second = run_compliance_cleanup(&storage, &clock, 2);
    assert!(second.succeeded());
    assert_eq!(
        (second.dependents_deleted, second.visits_deleted, second.profiles_deleted),
        (0, 0, 0)
    );

    let records = storage
        .with_conn(|conn| audit::list_audit_records(conn, 10))
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, AuditStatus::Ok);
    assert_eq!(records[0].dependents_deleted, 0);
    assert_eq!(records[0].visits_deleted, 0);
    assert_eq!(records[0].profiles_deleted, 0);
}

#[test]
fn active_visit_older_than_cutoff_is_purged() {
    let storage = FrontdeskStorage::open_in_memory().unwrap();
    let v = add_visitor(&storage, "Still", "Here");
    let visit_id = add_visit(&storage, v, now() - Duration::days(3 * 365), &[]);

    let report = run_compliance_cleanup(&storage, &FixedClock::new(now()), 2);
    assert_eq!(report.visits_deleted, 1);
    let gone = storage
        .with_conn(|conn| visits::get_visit(conn, visit_id))
        .unwrap();
    assert!(gone.is_none());
}

#[test]
fn failing_visit_delete_leaves_dependents_deleted_and_audits_error() {
    let storage = FrontdeskStorage::open_in_memory().unwrap();
    let v = add_visitor(&storage, "Old", "Timer");
    add_visit(&storage, v, now() - Duration::days(3 * 365), &["Kid"]);

    storage
        .with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER block_visit_delete BEFORE DELETE ON visits
                 BEGIN SELECT RAISE(ABORT, 'visit delete blocked'); END;",
            )
            .unwrap();
            Ok(())
        })
        .unwrap();

    let report = run_compliance_cleanup(&storage, &FixedClock::new(now()), 2);
    assert_eq!(report.status, AuditStatus::Error);
    assert_eq!(report.failed_step, Some("visits"));
    assert!(report.audit_written);

    // No rollback spans the steps.
    assert_eq!(count(&storage, "dependents"), 0);
    assert_eq!(count(&storage, "visits"), 1);
    assert_eq!(count(&storage, "visitors"), 1);

    let records = storage
        .with_conn(|conn| audit::list_audit_records(conn, 10))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_name, "Compliance Cleanup Failed");
    assert_eq!(records[0].status, AuditStatus::Error);
    assert_eq!(records[0].dependents_deleted, 1);
    assert_eq!(records[0].visits_deleted, 0);
    assert_eq!(records[0].profiles_deleted, 0);
}

#[test]
fn banned_visitor_without_visits_is_kept() {
    let storage = FrontdeskStorage::open_in_memory().unwrap();
    let banned = add_visitor(&storage, "Never", "Visited");
    ban(&storage, banned);
    let idle = add_visitor(&storage, "Also", "Idle");

    let report = run_compliance_cleanup(&storage, &FixedClock::new(now()), 2);
    assert_eq!(report.profiles_deleted, 1);
    let (kept, removed) = storage
        .with_conn(|conn| {
            Ok((
                visitors::get_visitor(conn, banned)?,
                visitors::get_visitor(conn, idle)?,
            ))
        })
        .unwrap();
    assert!(kept.is_some());
    assert!(removed.is_none());
}

#[test]
fn runs_against_file_backed_store() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FrontdeskStorage::open(&dir.path().join("visitors.db"), 1000).unwrap();
    let v = add_visitor(&storage, "Old", "Timer");
    add_visit(&storage, v, now() - Duration::days(900), &[]);

    let report = run_compliance_cleanup(&storage, &FixedClock::new(now()), 2);
    assert_eq!(report.visits_deleted, 1);
    assert_eq!(report.profiles_deleted, 1);
}

// ─── Property: cleanup invariants over random populations ───────────

#[derive(Debug, Clone)]
struct GenVisitor {
    banned: bool,
    visits: Vec<(i64, usize)>,
}

fn population() -> impl Strategy<Value = Vec<GenVisitor>> {
    let visitor = (
        any::<bool>(),
        prop::collection::vec((0i64..1500, 0usize..3), 0..4),
    )
        .prop_map(|(banned, visits)| GenVisitor { banned, visits });
    prop::collection::vec(visitor, 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cleanup_invariants_hold(people in population()) {
        let storage = FrontdeskStorage::open_in_memory().unwrap();
        let cutoff_instant = now().checked_sub_months(Months::new(24)).unwrap();

        let mut banned_ids = Vec::new();
        let mut expected_visits = 0u64;
        let mut expected_dependents = 0u64;
        let mut expected_profiles = 0u64;

        for (i, person) in people.iter().enumerate() {
            let id = add_visitor(&storage, &format!("P{i}"), "Gen");
            let mut kept_visits = 0;
            for (age_days, deps) in &person.visits {
                let at = now() - Duration::days(*age_days);
                let names: Vec<String> = (0..*deps).map(|d| format!("D{d}")).collect();
                let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                add_visit(&storage, id, at, &refs);
                if at < cutoff_instant {
                    expected_visits += 1;
                    expected_dependents += *deps as u64;
                } else {
                    kept_visits += 1;
                }
            }
            if person.banned {
                ban(&storage, id);
                banned_ids.push(id);
            } else if kept_visits == 0 {
                expected_profiles += 1;
            }
        }

        let report = run_compliance_cleanup(&storage, &FixedClock::new(now()), 2);
        prop_assert!(report.succeeded());
        prop_assert_eq!(report.visits_deleted, expected_visits);
        prop_assert_eq!(report.dependents_deleted, expected_dependents);
        prop_assert_eq!(report.profiles_deleted, expected_profiles);

        let (stale_visits, orphan_deps, empty_unbanned, audits): (i64, i64, i64, i64) = storage
            .with_conn(|conn| {
                let q = |sql: &str| -> i64 {
                    conn.query_row(sql, [], |r| r.get(0)).unwrap()
                };
                Ok((
                    q(&format!(
                        "SELECT COUNT(*) FROM visits WHERE entry_time < '{}'",
                        report.cutoff
                    )),
                    q("SELECT COUNT(*) FROM dependents d
                       WHERE NOT EXISTS (SELECT 1 FROM visits v WHERE v.id = d.visit_id)"),
                    q("SELECT COUNT(*) FROM visitors p WHERE p.is_banned = 0
                       AND NOT EXISTS (SELECT 1 FROM visits v WHERE v.visitor_id = p.id)"),
                    q("SELECT COUNT(*) FROM audit_logs"),
                ))
            })
            .unwrap();
        prop_assert_eq!(stale_visits, 0);
        prop_assert_eq!(orphan_deps, 0);
        prop_assert_eq!(empty_unbanned, 0);
        prop_assert_eq!(audits, 1);

        for id in banned_ids {
            let still_there = storage
                .with_conn(|conn| visitors::get_visitor(conn, id))
                .unwrap();
            prop_assert!(still_there.is_some());
        }
    }
}
