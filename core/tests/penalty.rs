use chrono::{DateTime, Duration, TimeZone, Utc};
use slawatch_core::{
    config::{PenaltyConfig, SlaConfig},
    engine::SlaEngine,
    penalty::tier_pct,
    snapshot::WorkSnapshot,
    work_item::WorkItem,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap()
}

fn hours_ago(h: i64) -> DateTime<Utc> {
    now() - Duration::hours(h)
}

/// Critical incident (4h window) resolved `late_hours` past its deadline.
fn late_incident(id: &str, late_hours: i64) -> WorkItem {
    let created = hours_ago(500);
    WorkItem::incident(id, "critical", created).resolved(created + Duration::hours(4 + late_hours))
}

/// Same schedule with the per-fault cap lifted, so tiers show through.
fn uncapped_engine() -> SlaEngine {
    let mut config = SlaConfig::default();
    config.penalty.per_fault_cap_pct = 100.0;
    config.penalty.aggregate_cap_pct = 100.0;
    SlaEngine::new(config).expect("valid config")
}

#[test]
fn tiers_pick_the_highest_reached_threshold() {
    let config = PenaltyConfig::default();
    assert_eq!(tier_pct(0.0, &config), 0.0);
    assert_eq!(tier_pct(3.99, &config), 0.0);
    assert_eq!(tier_pct(4.0, &config), 10.0);
    assert_eq!(tier_pct(12.0, &config), 15.0);
    assert_eq!(tier_pct(16.0, &config), 20.0);
    assert_eq!(tier_pct(72.0, &config), 30.0);
}

#[test]
fn on_time_and_slightly_late_incidents_cost_nothing() {
    let created = hours_ago(50);
    let snapshot = WorkSnapshot::new(now(), vec![
        WorkItem::incident("on-time", "critical", created).resolved(created + Duration::hours(2)),
        late_incident("late-2h", 2),
    ]);
    let summary = SlaEngine::with_defaults().penalty_exposure(&snapshot, now()).expect("penalty");

    assert_eq!(summary.total_penalty_amount, 0.0);
    assert_eq!(summary.penalised_fault_count, 0);
    assert!(!summary.termination_risk);
    let late = summary.incidents.iter().find(|e| e.incident_id == "late-2h").expect("row");
    assert_eq!(late.delay_hours, 2.0);
    assert_eq!(late.penalty_pct, 0.0);
}

#[test]
fn per_fault_cap_limits_each_incident() {
    let snapshot = WorkSnapshot::new(now(), vec![late_incident("very-late", 30)]);
    let summary = SlaEngine::with_defaults().penalty_exposure(&snapshot, now()).expect("penalty");

    let row = &summary.incidents[0];
    assert_eq!(row.penalty_pct, 10.0, "30% tier capped at 10% per fault");
    assert_eq!(row.penalty_amount, 270_000.0);
    assert_eq!(summary.total_penalty_pct, 10.0);
}

#[test]
fn uncapped_tiers_scale_the_amount() {
    let snapshot = WorkSnapshot::new(now(), vec![late_incident("l-5", 5), late_incident("l-20", 20)]);
    let summary = uncapped_engine().penalty_exposure(&snapshot, now()).expect("penalty");

    let by_id = |id: &str| summary.incidents.iter().find(|e| e.incident_id == id).expect("row");
    assert_eq!(by_id("l-5").penalty_amount, 270_000.0);
    assert_eq!(by_id("l-20").penalty_amount, 540_000.0);
    assert_eq!(summary.total_penalty_amount, 810_000.0);
    assert_eq!(summary.total_penalty_pct, 30.0);
}

#[test]
fn aggregate_cap_and_termination_threshold() {
    let snapshot = WorkSnapshot::new(now(), vec![
        late_incident("a", 5),
        late_incident("b", 9),
        late_incident("c", 25),
    ]);
    let summary = SlaEngine::with_defaults().penalty_exposure(&snapshot, now()).expect("penalty");

    assert_eq!(summary.penalised_fault_count, 3);
    assert_eq!(summary.total_penalty_amount, 540_000.0, "capped at 20% of the fee");
    assert_eq!(summary.total_penalty_pct, 20.0);
    assert!(summary.termination_risk);
}

#[test]
fn open_incidents_accrue_delay_until_now_and_invalid_timing_is_skipped() {
    let created = hours_ago(10);
    let snapshot = WorkSnapshot::new(now(), vec![
        WorkItem::incident("open-late", "critical", created),
        WorkItem::incident("bad", "critical", created).resolved(created - Duration::hours(1)),
        WorkItem::task("task-late", "corrective", hours_ago(500)).resolved(hours_ago(1)),
    ]);
    let summary = SlaEngine::with_defaults().penalty_exposure(&snapshot, now()).expect("penalty");

    assert_eq!(summary.incidents.len(), 1, "tasks and invalid timing carry no penalty");
    let row = &summary.incidents[0];
    assert_eq!(row.incident_id, "open-late");
    assert_eq!(row.measured_at, now());
    assert_eq!(row.delay_hours, 6.0);
    assert_eq!(row.penalty_pct, 10.0);
}
