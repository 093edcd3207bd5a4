//! Rollup trait, evaluation pass and shared aggregation helpers.
//!
//! RULE: Every rollup implements Rollup and reads the pass's single
//! reference instant. Rollups never see each other's output and can be
//! computed in any order, or concurrently, over the same snapshot.
//!
//! RULE: Grouping uses ordered maps and integer accumulators so the
//! result never depends on input item order.

use crate::{
    classifier::{Classification, Classifier, SlaStatus},
    config::SlaConfig,
    error::SlaResult,
    snapshot::WorkSnapshot,
    work_item::WorkItem,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One computation pass: a snapshot, one `now`, one classifier.
pub struct EvaluationPass<'a> {
    pub snapshot:   &'a WorkSnapshot,
    pub now:        DateTime<Utc>,
    pub classifier: &'a Classifier,
    pub config:     &'a SlaConfig,
}

impl<'a> EvaluationPass<'a> {
    pub fn new(
        snapshot: &'a WorkSnapshot,
        now: DateTime<Utc>,
        classifier: &'a Classifier,
        config: &'a SlaConfig,
    ) -> Self {
        Self { snapshot, now, classifier, config }
    }

    pub fn classify(&self, item: &WorkItem) -> SlaResult<Classification> {
        self.classifier.classify(item, self.now)
    }

    /// Classify every item matching `keep`. The first unmapped category
    /// aborts the whole selection.
    pub fn classified<F>(&self, keep: F) -> SlaResult<Vec<(&'a WorkItem, Classification)>>
    where
        F: Fn(&WorkItem) -> bool,
    {
        self.snapshot
            .items
            .iter()
            .filter(|item| keep(item))
            .map(|item| Ok((item, self.classify(item)?)))
            .collect()
    }

    pub fn days_before_now(&self, days: i64) -> DateTime<Utc> {
        self.now - Duration::days(days)
    }
}

/// The contract every rollup fulfils.
pub trait Rollup {
    type Output;

    /// Unique stable name, used in logs and failure reports.
    fn name(&self) -> &'static str;

    fn compute(&self, pass: &EvaluationPass<'_>) -> SlaResult<Self::Output>;
}

// ── Aggregation helpers ──────────────────────────────────────────────────────

/// Per-status counts. `total` also counts invalid-timing items, which
/// carry no status; compliance denominators exclude them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusTally {
    pub total:          u32,
    pub within_sla:     u32,
    pub at_risk:        u32,
    pub critical:       u32,
    pub breached:       u32,
    pub invalid_timing: u32,
}

impl StatusTally {
    pub fn record(&mut self, classification: &Classification) {
        self.total += 1;
        match classification.status() {
            Some(SlaStatus::WithinSla) => self.within_sla += 1,
            Some(SlaStatus::AtRisk)    => self.at_risk += 1,
            Some(SlaStatus::Critical)  => self.critical += 1,
            Some(SlaStatus::Breached)  => self.breached += 1,
            None                       => self.invalid_timing += 1,
        }
    }

    pub fn count(&self, status: SlaStatus) -> u32 {
        match status {
            SlaStatus::WithinSla => self.within_sla,
            SlaStatus::AtRisk    => self.at_risk,
            SlaStatus::Critical  => self.critical,
            SlaStatus::Breached  => self.breached,
        }
    }

    pub fn evaluated(&self) -> u32 {
        self.total - self.invalid_timing
    }

    pub fn compliance_pct(&self) -> Option<f64> {
        percentage(self.within_sla, self.evaluated())
    }

    pub fn at_risk_pct(&self) -> Option<f64> {
        percentage(self.at_risk + self.critical, self.evaluated())
    }
}

/// `part / whole` as a percentage rounded to 2 places; `None` when the
/// denominator is zero.
pub fn percentage(part: u32, whole: u32) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    Some(round_to(f64::from(part) * 100.0 / f64::from(whole), 2))
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Running mean of durations, summed in whole seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationMean {
    total_seconds: i64,
    count:         u32,
}

impl DurationMean {
    pub fn add(&mut self, duration: Duration) {
        self.total_seconds += duration.num_seconds();
        self.count += 1;
    }

    /// Resolution time of a valid resolved item; ignored otherwise.
    pub fn add_resolution(&mut self, item: &WorkItem, classification: &Classification) {
        if let (Some(resolved_at), true) = (item.resolved_at, classification.has_valid_timing()) {
            self.add(resolved_at - item.created_at);
        }
    }

    /// Mean in minutes, rounded to 1 place.
    pub fn mean_minutes(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(round_to(self.total_seconds as f64 / 60.0 / f64::from(self.count), 1))
    }
}

/// Compliant / evaluated counter for the resolved-binary rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplianceCounter {
    pub compliant: u32,
    pub evaluated: u32,
}

impl ComplianceCounter {
    /// Counts only resolved items with valid timing.
    pub fn record_resolved(&mut self, classification: &Classification) {
        if classification.is_open() {
            return;
        }
        if let Some(status) = classification.status() {
            self.evaluated += 1;
            if status == SlaStatus::WithinSla {
                self.compliant += 1;
            }
        }
    }

    pub fn merge(&self, other: &ComplianceCounter) -> ComplianceCounter {
        ComplianceCounter {
            compliant: self.compliant + other.compliant,
            evaluated: self.evaluated + other.evaluated,
        }
    }

    pub fn pct(&self) -> Option<f64> {
        percentage(self.compliant, self.evaluated)
    }
}
