//! The SLA engine: one classifier, one config, every rollup.
//!
//! EVALUATION ORDER (fixed, documented):
//!   1. Executive overview
//!   2. Site reliability
//!   3. Technician performance
//!   4. Regional analytics
//!   5. Trend analysis
//!   6. Alert ranker
//!   7. Item monitors (incident, task, access request)
//!   8. Penalty exposure
//!
//! RULES:
//!   - The clock is read once per evaluate(); every rollup sees that instant.
//!   - Rollups never read each other's output. The order above only fixes
//!     the order of log lines and failure reports.
//!   - A rollup that fails is reported in `failures`; the others still run.

use crate::{
    alert_ranker::{AlertEntry, AlertFilter, AlertRanker},
    classifier::Classifier,
    clock::Clock,
    config::SlaConfig,
    error::SlaResult,
    event::{AlertSink, SlaEvent},
    executive_overview::{ExecutiveOverview, ExecutiveSummary},
    item_monitor::{ItemFilter, ItemMonitor, ItemSlaRecord},
    penalty::{PenaltyCalculator, QuarterPenaltySummary},
    query::Page,
    regional_analytics::{RegionFilter, RegionSummary, RegionalAnalytics},
    rollup::{EvaluationPass, Rollup},
    site_reliability::{SiteFilter, SiteReliability, SiteSummary},
    snapshot::WorkSnapshot,
    technician_performance::{TechnicianFilter, TechnicianPerformance, TechnicianSummary},
    trend_analysis::{TrendAnalysis, TrendFilter, TrendPoint},
    work_item::ItemKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rollup that could not be computed in an evaluate() pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RollupFailure {
    pub rollup:  String,
    pub message: String,
}

/// Every rollup for one snapshot at one instant. A `None` section failed;
/// its reason is in `failures`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    pub evaluated_at:    DateTime<Utc>,
    pub item_count:      usize,
    pub executive:       Option<ExecutiveSummary>,
    pub sites:           Option<Vec<SiteSummary>>,
    pub technicians:     Option<Vec<TechnicianSummary>>,
    pub regions:         Option<Vec<RegionSummary>>,
    pub trends:          Option<Vec<TrendPoint>>,
    pub alerts:          Option<Vec<AlertEntry>>,
    pub incidents:       Option<Vec<ItemSlaRecord>>,
    pub tasks:           Option<Vec<ItemSlaRecord>>,
    pub access_requests: Option<Vec<ItemSlaRecord>>,
    pub penalty:         Option<QuarterPenaltySummary>,
    pub failures:        Vec<RollupFailure>,
}

impl Dashboard {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct SlaEngine {
    config:     SlaConfig,
    classifier: Classifier,
}

impl SlaEngine {
    /// Validates the config; a bad rule table or threshold set never
    /// reaches a pass.
    pub fn new(config: SlaConfig) -> SlaResult<Self> {
        config.validate()?;
        let classifier = Classifier::new(config.rules.clone(), config.thresholds);
        Ok(Self { config, classifier })
    }

    pub fn with_defaults() -> Self {
        let config = SlaConfig::default();
        let classifier = Classifier::new(config.rules.clone(), config.thresholds);
        Self { config, classifier }
    }

    pub fn config(&self) -> &SlaConfig {
        &self.config
    }

    pub fn pass<'a>(&'a self, snapshot: &'a WorkSnapshot, now: DateTime<Utc>) -> EvaluationPass<'a> {
        EvaluationPass::new(snapshot, now, &self.classifier, &self.config)
    }

    /// Run a single rollup at `now`.
    pub fn run<R: Rollup>(
        &self,
        rollup: &R,
        snapshot: &WorkSnapshot,
        now: DateTime<Utc>,
    ) -> SlaResult<R::Output> {
        rollup.compute(&self.pass(snapshot, now))
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn executive_overview(
        &self,
        snapshot: &WorkSnapshot,
        now: DateTime<Utc>,
    ) -> SlaResult<ExecutiveSummary> {
        self.run(&ExecutiveOverview, snapshot, now)
    }

    pub fn site_reliability(
        &self,
        snapshot: &WorkSnapshot,
        now: DateTime<Utc>,
        filter: &SiteFilter,
    ) -> SlaResult<Page<SiteSummary>> {
        let rows = self.run(&SiteReliability, snapshot, now)?;
        Ok(paged(rows, |r| filter.matches(r), filter.pagination))
    }

    pub fn technician_performance(
        &self,
        snapshot: &WorkSnapshot,
        now: DateTime<Utc>,
        filter: &TechnicianFilter,
    ) -> SlaResult<Page<TechnicianSummary>> {
        let rows = self.run(&TechnicianPerformance, snapshot, now)?;
        Ok(paged(rows, |r| filter.matches(r), filter.pagination))
    }

    pub fn regional_analytics(
        &self,
        snapshot: &WorkSnapshot,
        now: DateTime<Utc>,
        filter: &RegionFilter,
    ) -> SlaResult<Page<RegionSummary>> {
        let rows = self.run(&RegionalAnalytics, snapshot, now)?;
        Ok(paged(rows, |r| filter.matches(r), filter.pagination))
    }

    /// Newest day first, at most `filter.limit` rows.
    pub fn trend_analysis(
        &self,
        snapshot: &WorkSnapshot,
        now: DateTime<Utc>,
        filter: &TrendFilter,
    ) -> SlaResult<Vec<TrendPoint>> {
        let rollup = TrendAnalysis::for_region(filter.region.clone());
        let rows = self.run(&rollup, snapshot, now)?;
        Ok(rows
            .into_iter()
            .filter(|r| filter.matches(r))
            .take(filter.limit)
            .collect())
    }

    pub fn alerts(
        &self,
        snapshot: &WorkSnapshot,
        now: DateTime<Utc>,
        filter: &AlertFilter,
    ) -> SlaResult<Page<AlertEntry>> {
        let rows = self.run(&AlertRanker, snapshot, now)?;
        Ok(paged(rows, |r| filter.matches(r), filter.pagination))
    }

    pub fn items(
        &self,
        kind: ItemKind,
        snapshot: &WorkSnapshot,
        now: DateTime<Utc>,
        filter: &ItemFilter,
    ) -> SlaResult<Page<ItemSlaRecord>> {
        let rows = self.run(&ItemMonitor::new(kind), snapshot, now)?;
        Ok(paged(rows, |r| filter.matches(r), filter.pagination))
    }

    pub fn penalty_exposure(
        &self,
        snapshot: &WorkSnapshot,
        now: DateTime<Utc>,
    ) -> SlaResult<QuarterPenaltySummary> {
        self.run(&PenaltyCalculator, snapshot, now)
    }

    // ── Full pass ──────────────────────────────────────────────

    /// Read the clock once and compute every rollup against that instant.
    pub fn evaluate(&self, snapshot: &WorkSnapshot, clock: &dyn Clock) -> Dashboard {
        let now = clock.now();
        let pass = self.pass(snapshot, now);
        let mut failures = Vec::new();

        let dashboard = Dashboard {
            evaluated_at:    now,
            item_count:      snapshot.items.len(),
            executive:       attempt(&ExecutiveOverview, &pass, &mut failures),
            sites:           attempt(&SiteReliability, &pass, &mut failures),
            technicians:     attempt(&TechnicianPerformance, &pass, &mut failures),
            regions:         attempt(&RegionalAnalytics, &pass, &mut failures),
            trends:          attempt(&TrendAnalysis::default(), &pass, &mut failures),
            alerts:          attempt(&AlertRanker, &pass, &mut failures),
            incidents:       attempt(&ItemMonitor::new(ItemKind::Incident), &pass, &mut failures),
            tasks:           attempt(&ItemMonitor::new(ItemKind::Task), &pass, &mut failures),
            access_requests: attempt(&ItemMonitor::new(ItemKind::AccessRequest), &pass, &mut failures),
            penalty:         attempt(&PenaltyCalculator, &pass, &mut failures),
            failures,
        };

        log::debug!(
            "evaluate: {} items at {now}, {} rollup failures",
            dashboard.item_count,
            dashboard.failures.len(),
        );
        dashboard
    }

    /// Deliver one event per alert-feed entry, in feed order. Returns the
    /// number delivered.
    pub fn publish_alerts(
        &self,
        snapshot: &WorkSnapshot,
        now: DateTime<Utc>,
        sink: &mut dyn AlertSink,
    ) -> SlaResult<usize> {
        let feed = self.run(&AlertRanker, snapshot, now)?;
        for alert in &feed {
            sink.deliver(&SlaEvent::from_alert(alert, now))?;
        }
        log::info!("publish_alerts: {} events delivered", feed.len());
        Ok(feed.len())
    }
}

fn attempt<R: Rollup>(
    rollup: &R,
    pass: &EvaluationPass<'_>,
    failures: &mut Vec<RollupFailure>,
) -> Option<R::Output> {
    match rollup.compute(pass) {
        Ok(output) => Some(output),
        Err(e) => {
            log::warn!("{} failed: {e}", rollup.name());
            failures.push(RollupFailure {
                rollup:  rollup.name().to_string(),
                message: e.to_string(),
            });
            None
        }
    }
}

fn paged<T, F>(rows: Vec<T>, keep: F, pagination: crate::query::Pagination) -> Page<T>
where
    F: Fn(&T) -> bool,
{
    let filtered: Vec<T> = rows.into_iter().filter(|r| keep(r)).collect();
    Page::from_sorted(filtered, pagination)
}
