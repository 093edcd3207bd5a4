//! Trend analysis — daily compliance series per item kind.
//!
//! Rows are keyed by the UTC day an item was resolved, so open items never
//! appear. Incidents and tasks form two independent series; they are never
//! merged into one row.

use crate::{
    classifier::SlaStatus,
    error::SlaResult,
    query::DEFAULT_LIMIT,
    rollup::{percentage, EvaluationPass, Rollup},
    work_item::ItemKind,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendPoint {
    pub date:                  NaiveDate,
    pub kind:                  ItemKind,
    pub item_count:            u32,
    pub compliant_count:       u32,
    pub invalid_timing_count:  u32,
    pub compliance_percentage: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrendFilter {
    pub kind:      Option<ItemKind>,
    /// Restricts the items aggregated, not the rows.
    pub region:    Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date:   Option<NaiveDate>,
    pub limit:     usize,
}

impl Default for TrendFilter {
    fn default() -> Self {
        Self { kind: None, region: None, from_date: None, to_date: None, limit: DEFAULT_LIMIT }
    }
}

impl TrendFilter {
    pub fn matches(&self, row: &TrendPoint) -> bool {
        self.kind.map_or(true, |k| row.kind == k)
            && self.from_date.map_or(true, |d| row.date >= d)
            && self.to_date.map_or(true, |d| row.date <= d)
    }
}

#[derive(Default)]
struct DayAccumulator {
    item_count:     u32,
    compliant:      u32,
    invalid_timing: u32,
}

/// Optionally scoped to one region.
#[derive(Debug, Clone, Default)]
pub struct TrendAnalysis {
    pub region: Option<String>,
}

impl TrendAnalysis {
    pub fn for_region(region: Option<String>) -> Self {
        Self { region }
    }
}

impl Rollup for TrendAnalysis {
    type Output = Vec<TrendPoint>;

    fn name(&self) -> &'static str {
        "trend_analysis"
    }

    /// Newest day first; incidents before tasks within a day.
    fn compute(&self, pass: &EvaluationPass<'_>) -> SlaResult<Vec<TrendPoint>> {
        let since = pass.days_before_now(pass.config.windows.trailing_days);
        let classified = pass.classified(|item| {
            matches!(item.kind, ItemKind::Incident | ItemKind::Task)
                && item.resolved_at.is_some_and(|at| at >= since)
                && self.region.as_ref().map_or(true, |r| item.region.as_ref() == Some(r))
        })?;

        let mut days: BTreeMap<(NaiveDate, ItemKind), DayAccumulator> = BTreeMap::new();
        for (item, classification) in &classified {
            let Some(resolved_at) = item.resolved_at else { continue };
            let acc = days.entry((resolved_at.date_naive(), item.kind)).or_default();
            acc.item_count += 1;
            match classification.status() {
                Some(SlaStatus::WithinSla) => acc.compliant += 1,
                Some(_) => {}
                None => acc.invalid_timing += 1,
            }
        }

        let mut rows: Vec<TrendPoint> = days
            .into_iter()
            .map(|((date, kind), acc)| TrendPoint {
                date,
                kind,
                item_count:            acc.item_count,
                compliant_count:       acc.compliant,
                invalid_timing_count:  acc.invalid_timing,
                compliance_percentage: percentage(acc.compliant, acc.item_count - acc.invalid_timing),
            })
            .collect();

        rows.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.kind.cmp(&b.kind)));

        log::debug!("trend_analysis: {} day/kind rows since {since}", rows.len());
        Ok(rows)
    }
}
