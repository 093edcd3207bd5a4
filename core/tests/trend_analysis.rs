use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use slawatch_core::{
    engine::SlaEngine,
    snapshot::WorkSnapshot,
    trend_analysis::TrendFilter,
    work_item::{ItemKind, WorkItem},
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, day, hour, 0, 0).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
}

fn snapshot() -> WorkSnapshot {
    WorkSnapshot::new(now(), vec![
        // Resolved 10 Feb: two incidents (one late), one task in time.
        WorkItem::incident("i-1", "critical", at(10, 1)).resolved(at(10, 2)).in_region("north"),
        WorkItem::incident("i-2", "critical", at(10, 1)).resolved(at(10, 9)).in_region("south"),
        WorkItem::task("t-1", "corrective", at(9, 8)).resolved(at(10, 8)).in_region("north"),
        // Resolved 12 Feb.
        WorkItem::incident("i-3", "major", at(12, 1)).resolved(at(12, 3)).in_region("north"),
        // Invalid timing, resolved 12 Feb.
        WorkItem::incident("i-4", "major", at(12, 10)).resolved(at(12, 5)).in_region("north"),
        // Open and access requests never appear.
        WorkItem::incident("i-open", "minor", at(27, 1)).in_region("north"),
        WorkItem::access_request("ar-1", at(11, 1)).resolved(at(11, 2)).in_region("north"),
    ])
}

#[test]
fn one_row_per_day_and_kind_newest_first() {
    let rows = SlaEngine::with_defaults()
        .trend_analysis(&snapshot(), now(), &TrendFilter::default())
        .expect("trend rollup");

    let keys: Vec<(NaiveDate, ItemKind)> = rows.iter().map(|r| (r.date, r.kind)).collect();
    assert_eq!(keys, vec![
        (date(12), ItemKind::Incident),
        (date(10), ItemKind::Incident),
        (date(10), ItemKind::Task),
    ]);

    let feb10 = &rows[1];
    assert_eq!(feb10.item_count, 2);
    assert_eq!(feb10.compliant_count, 1);
    assert_eq!(feb10.compliance_percentage, Some(50.0));

    let feb12 = &rows[0];
    assert_eq!(feb12.item_count, 2);
    assert_eq!(feb12.invalid_timing_count, 1);
    assert_eq!(feb12.compliance_percentage, Some(100.0), "invalid timing leaves the denominator");
}

#[test]
fn kind_and_date_filters() {
    let filter = TrendFilter {
        kind:      Some(ItemKind::Incident),
        from_date: Some(date(11)),
        ..TrendFilter::default()
    };
    let rows = SlaEngine::with_defaults()
        .trend_analysis(&snapshot(), now(), &filter)
        .expect("trend rollup");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, date(12));
}

#[test]
fn region_filter_restricts_aggregated_items() {
    let filter = TrendFilter { region: Some("north".into()), ..TrendFilter::default() };
    let rows = SlaEngine::with_defaults()
        .trend_analysis(&snapshot(), now(), &filter)
        .expect("trend rollup");

    let feb10_incidents = rows
        .iter()
        .find(|r| r.date == date(10) && r.kind == ItemKind::Incident)
        .expect("row");
    assert_eq!(feb10_incidents.item_count, 1);
    assert_eq!(feb10_incidents.compliance_percentage, Some(100.0));
}

#[test]
fn limit_caps_rows() {
    let filter = TrendFilter { limit: 2, ..TrendFilter::default() };
    let rows = SlaEngine::with_defaults()
        .trend_analysis(&snapshot(), now(), &filter)
        .expect("trend rollup");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, date(12));
}
