use chrono::{DateTime, Duration, TimeZone, Utc};
use slawatch_core::{
    alert_ranker::AlertLevel,
    engine::SlaEngine,
    event::{AlertSink, CollectingSink, SlaEvent},
    error::SlaResult,
    snapshot::WorkSnapshot,
    store::SlaStore,
    work_item::WorkItem,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

fn minutes_ago(m: i64) -> DateTime<Utc> {
    now() - Duration::minutes(m)
}

fn snapshot() -> WorkSnapshot {
    WorkSnapshot::new(now(), vec![
        WorkItem::incident("inc-late", "critical", minutes_ago(300)).at_site("s-1"),
        WorkItem::incident("inc-close", "critical", minutes_ago(230)),
        WorkItem::incident("inc-fine", "critical", minutes_ago(5)),
    ])
}

#[test]
fn one_event_per_alert_in_feed_order() {
    let mut sink = CollectingSink::default();
    let delivered = SlaEngine::with_defaults()
        .publish_alerts(&snapshot(), now(), &mut sink)
        .expect("publish");

    assert_eq!(delivered, 2);
    match &sink.events[0] {
        SlaEvent::SlaBreach { item_id, overdue_minutes, site_id, detected_at, .. } => {
            assert_eq!(item_id, "inc-late");
            assert_eq!(*overdue_minutes, 60);
            assert_eq!(site_id.as_deref(), Some("s-1"));
            assert_eq!(*detected_at, now());
        }
        other => panic!("expected a breach first, got {other:?}"),
    }
    match &sink.events[1] {
        SlaEvent::SlaWarning { item_id, alert_level, remaining_minutes, .. } => {
            assert_eq!(item_id, "inc-close");
            assert_eq!(*alert_level, AlertLevel::Critical);
            assert_eq!(*remaining_minutes, 10);
        }
        other => panic!("expected a warning second, got {other:?}"),
    }
}

#[test]
fn events_serialize_with_an_event_type_tag() {
    let mut sink = CollectingSink::default();
    SlaEngine::with_defaults()
        .publish_alerts(&snapshot(), now(), &mut sink)
        .expect("publish");

    let json = serde_json::to_value(&sink.events[0]).expect("serialize");
    assert_eq!(json["event_type"], "sla_breach");
    assert_eq!(json["kind"], "incident");
    let back: SlaEvent = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, sink.events[0]);
}

#[test]
fn store_keeps_an_alert_log() {
    let mut store = SlaStore::in_memory().expect("store");
    store.migrate().expect("migration");
    SlaEngine::with_defaults()
        .publish_alerts(&snapshot(), now(), &mut store)
        .expect("publish");

    let all = store.alerts(None).expect("alert log");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].event_type, "sla_breach");
    assert_eq!(all[1].event_type, "sla_warning");

    let late = store.alerts(Some("inc-late")).expect("alert log");
    assert_eq!(late.len(), 1);
    assert_eq!(late[0].detected_at, now());
    assert_eq!(late[0].event().expect("payload").item_id(), "inc-late");
}

struct FailingSink;

impl AlertSink for FailingSink {
    fn deliver(&mut self, _event: &SlaEvent) -> SlaResult<()> {
        Err(anyhow::anyhow!("webhook unreachable").into())
    }
}

#[test]
fn sink_failure_is_returned_to_the_caller() {
    let err = SlaEngine::with_defaults()
        .publish_alerts(&snapshot(), now(), &mut FailingSink)
        .expect_err("sink fails");
    assert!(!err.is_configuration());
    assert!(err.to_string().contains("webhook unreachable"));
}

#[test]
fn breach_by_seconds_is_reported_one_minute_overdue() {
    let snapshot = WorkSnapshot::new(now(), vec![
        WorkItem::incident("inc-just-late", "critical", minutes_ago(240) - Duration::seconds(30)),
    ]);
    let mut sink = CollectingSink::default();
    SlaEngine::with_defaults()
        .publish_alerts(&snapshot, now(), &mut sink)
        .expect("publish");

    match &sink.events[0] {
        SlaEvent::SlaBreach { overdue_minutes, .. } => assert_eq!(*overdue_minutes, 1),
        other => panic!("expected a breach, got {other:?}"),
    }
}
