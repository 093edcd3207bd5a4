use chrono::{DateTime, Duration, TimeZone, Utc};
use slawatch_core::{
    engine::SlaEngine,
    snapshot::WorkSnapshot,
    work_item::WorkItem,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

fn days_ago(d: i64) -> DateTime<Utc> {
    now() - Duration::days(d)
}

fn resolved_incident(id: &str, created: DateTime<Utc>, took_minutes: i64) -> WorkItem {
    WorkItem::incident(id, "critical", created).resolved(created + Duration::minutes(took_minutes))
}

#[test]
fn counts_only_resolved_items_inside_trailing_window() {
    let snapshot = WorkSnapshot::new(now(), vec![
        resolved_incident("inc-1", days_ago(10), 100),  // within
        resolved_incident("inc-2", days_ago(20), 300),  // breached
        resolved_incident("inc-3", days_ago(120), 100), // outside window
        WorkItem::incident("inc-4", "critical", days_ago(1)), // open, breached
    ]);
    let summary = SlaEngine::with_defaults()
        .executive_overview(&snapshot, now())
        .expect("overview");

    assert_eq!(summary.total_items, 2, "open and out-of-window items must not count");
    assert_eq!(summary.within_sla_count, 1);
    assert_eq!(summary.breached_count, 1);
    assert_eq!(summary.compliance_percentage, Some(50.0));
    assert_eq!(summary.at_risk_percentage, Some(0.0));
    assert_eq!(summary.window_start, days_ago(90));
    assert_eq!(summary.last_updated, now());
}

#[test]
fn invalid_timing_counts_in_total_but_not_in_compliance() {
    let created = days_ago(5);
    let snapshot = WorkSnapshot::new(now(), vec![
        resolved_incident("inc-ok", days_ago(3), 60),
        WorkItem::incident("inc-bad", "minor", created).resolved(created - Duration::hours(1)),
    ]);
    let summary = SlaEngine::with_defaults()
        .executive_overview(&snapshot, now())
        .expect("overview");

    assert_eq!(summary.total_items, 2);
    assert_eq!(summary.invalid_timing_count, 1);
    assert_eq!(
        summary.total_items,
        summary.within_sla_count
            + summary.at_risk_count
            + summary.critical_count
            + summary.breached_count
            + summary.invalid_timing_count
    );
    assert_eq!(summary.compliance_percentage, Some(100.0));
}

#[test]
fn empty_snapshot_reports_null_compliance() {
    let snapshot = WorkSnapshot::new(now(), Vec::new());
    let summary = SlaEngine::with_defaults()
        .executive_overview(&snapshot, now())
        .expect("overview");

    assert_eq!(summary.total_items, 0);
    assert_eq!(summary.compliance_percentage, None, "no data is not 0% or 100%");
    assert_eq!(summary.at_risk_percentage, None);
}

#[test]
fn unmapped_category_fails_the_rollup() {
    let snapshot = WorkSnapshot::new(now(), vec![
        WorkItem::incident("inc-x", "apocalyptic", days_ago(2)).resolved(days_ago(1)),
    ]);
    let err = SlaEngine::with_defaults()
        .executive_overview(&snapshot, now())
        .expect_err("unmapped category");
    assert!(err.is_configuration());
}
