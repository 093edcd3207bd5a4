//! Per-item classification: the open four-state rule, the resolved binary
//! rule, invalid timing and unmapped categories.

use chrono::{DateTime, Duration, TimeZone, Utc};
use slawatch_core::{
    classifier::{classify_with_window, Classifier, Outcome, SlaStatus},
    config::StatusThresholds,
    error::SlaError,
    rules::RuleTable,
    work_item::{ItemKind, WorkItem},
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

fn minutes_ago(m: i64) -> DateTime<Utc> {
    now() - Duration::minutes(m)
}

#[test]
fn critical_incident_well_inside_window_is_within_sla() {
    let item = WorkItem::incident("inc-a", "critical", minutes_ago(100));
    let c = Classifier::default().classify(&item, now()).expect("mapped");

    assert_eq!(c.window_minutes, 240);
    assert_eq!(c.status(), Some(SlaStatus::WithinSla));
    assert_eq!(c.remaining_minutes(), Some(140));
    let ratio = c.elapsed_ratio().expect("open item has a ratio");
    assert!((ratio - 0.4167).abs() < 0.001, "ratio was {ratio}");
}

#[test]
fn breach_by_seconds_reports_a_negative_remaining_minute() {
    let item = WorkItem::incident("inc-just-late", "critical", minutes_ago(240) - Duration::seconds(30));
    let c = Classifier::default().classify(&item, now()).expect("mapped");

    assert_eq!(c.status(), Some(SlaStatus::Breached));
    assert_eq!(c.remaining_minutes(), Some(-1), "partial overdue minute rounds down");
}

#[test]
fn partial_minutes_round_toward_the_past() {
    let late = WorkItem::incident("inc-late", "critical", minutes_ago(250) - Duration::seconds(30));
    let early = WorkItem::incident("inc-early", "critical", minutes_ago(100) + Duration::seconds(30));
    let classifier = Classifier::default();

    assert_eq!(classifier.classify(&late, now()).expect("mapped").remaining_minutes(), Some(-11));
    assert_eq!(classifier.classify(&early, now()).expect("mapped").remaining_minutes(), Some(140));
}

#[test]
fn critical_incident_at_220_minutes_is_critical() {
    let item = WorkItem::incident("inc-b", "critical", minutes_ago(220));
    let c = Classifier::default().classify(&item, now()).expect("mapped");

    assert_eq!(c.status(), Some(SlaStatus::Critical));
    assert_eq!(c.remaining_minutes(), Some(20));
}

#[test]
fn critical_incident_past_deadline_is_breached_with_negative_remaining() {
    let item = WorkItem::incident("inc-c", "critical", minutes_ago(250));
    let c = Classifier::default().classify(&item, now()).expect("mapped");

    assert_eq!(c.status(), Some(SlaStatus::Breached));
    assert_eq!(c.remaining_minutes(), Some(-10));
}

#[test]
fn resolved_late_task_is_breached_under_binary_rule() {
    let created = minutes_ago(5000);
    let item = WorkItem::task("task-d", "corrective", created)
        .resolved(created + Duration::minutes(3000));
    let c = Classifier::default().classify(&item, now()).expect("mapped");

    assert_eq!(c.window_minutes, 2880);
    assert_eq!(c.status(), Some(SlaStatus::Breached));
    assert_eq!(c.actual_minutes(), Some(3000));
    assert_eq!(c.remaining_minutes(), None, "resolved items have no remaining time");
}

#[test]
fn resolved_item_never_gets_intermediate_labels() {
    // 95% of the window used, but resolved in time.
    let created = minutes_ago(1000);
    let item = WorkItem::incident("inc-late-ish", "critical", created)
        .resolved(created + Duration::minutes(228));
    let c = Classifier::default().classify(&item, now()).expect("mapped");
    assert_eq!(c.status(), Some(SlaStatus::WithinSla));
}

#[test]
fn access_request_with_40_minutes_left_is_within_sla() {
    let item = WorkItem::access_request("ar-e", minutes_ago(80));
    let c = Classifier::default().classify(&item, now()).expect("mapped");

    assert_eq!(c.window_minutes, 120);
    assert_eq!(c.status(), Some(SlaStatus::WithinSla));
    assert_eq!(c.remaining_minutes(), Some(40));
}

#[test]
fn at_risk_boundary_is_inclusive() {
    // 70% of 120 minutes = 84 minutes elapsed.
    let item = WorkItem::access_request("ar-edge", minutes_ago(84));
    let c = Classifier::default().classify(&item, now()).expect("mapped");
    assert_eq!(c.status(), Some(SlaStatus::AtRisk));
}

#[test]
fn exactly_at_deadline_is_critical_not_breached() {
    let item = WorkItem::access_request("ar-deadline", minutes_ago(120));
    let c = Classifier::default().classify(&item, now()).expect("mapped");
    assert_eq!(c.status(), Some(SlaStatus::Critical));
    assert_eq!(c.remaining_minutes(), Some(0));
}

#[test]
fn open_status_never_improves_as_now_advances() {
    let item = WorkItem::incident("inc-mono", "major", minutes_ago(0));
    let classifier = Classifier::default();
    let mut previous = SlaStatus::WithinSla;
    for step in 0..60 {
        let at = now() + Duration::minutes(step * 10);
        let status = classifier
            .classify(&item, at)
            .expect("mapped")
            .status()
            .expect("valid timing");
        assert!(status >= previous, "status went from {previous} to {status} at step {step}");
        previous = status;
    }
    assert_eq!(previous, SlaStatus::Breached);
}

#[test]
fn breached_exactly_when_deadline_is_before_now() {
    let classifier = Classifier::default();
    for age in [0, 200, 239, 240, 241, 500] {
        let item = WorkItem::incident(format!("inc-{age}"), "critical", minutes_ago(age));
        let c = classifier.classify(&item, now()).expect("mapped");
        assert_eq!(
            c.status() == Some(SlaStatus::Breached),
            c.deadline < now(),
            "age {age}: status {:?}, deadline {}",
            c.status(),
            c.deadline
        );
    }
}

#[test]
fn classification_is_idempotent_for_fixed_now() {
    let item = WorkItem::task("task-idem", "routine_maintenance", minutes_ago(3500));
    let classifier = Classifier::default();
    let first = classifier.classify(&item, now()).expect("mapped");
    let second = classifier.classify(&item, now()).expect("mapped");
    assert_eq!(first, second);
}

#[test]
fn resolution_before_creation_is_invalid_timing() {
    let created = minutes_ago(100);
    let item = WorkItem::incident("inc-bad", "minor", created)
        .resolved(created - Duration::minutes(5));
    let c = Classifier::default().classify(&item, now()).expect("mapped");

    assert_eq!(c.outcome, Outcome::InvalidTiming);
    assert_eq!(c.status(), None);
    assert!(!c.has_valid_timing());
}

#[test]
fn unmapped_category_is_a_configuration_error() {
    let item = WorkItem::incident("inc-x", "catastrophic", now());
    let err = Classifier::default()
        .classify(&item, now())
        .expect_err("no rule for catastrophic");

    assert!(err.is_configuration());
    match err {
        SlaError::UnmappedCategory { item_id, kind, category } => {
            assert_eq!(item_id, "inc-x");
            assert_eq!(kind, ItemKind::Incident);
            assert_eq!(category.as_deref(), Some("catastrophic"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn custom_thresholds_move_the_status_boundaries() {
    let thresholds = StatusThresholds { at_risk_ratio: 0.5, critical_ratio: 0.8 };
    let item = WorkItem::access_request("ar-custom", minutes_ago(60));
    let c = classify_with_window(&item, 120, &thresholds, now());
    assert_eq!(c.status(), Some(SlaStatus::AtRisk));

    let classifier = Classifier::new(RuleTable::defaults(), thresholds);
    let late = WorkItem::access_request("ar-custom-late", minutes_ago(100));
    assert_eq!(
        classifier.classify(&late, now()).expect("mapped").status(),
        Some(SlaStatus::Critical)
    );
}
