//! Executive overview — one headline row for the trailing window.
//!
//! Only resolved items created inside the window are counted, so open
//! work never moves the headline compliance figure. Resolved items go
//! through the binary rule, which leaves the at-risk share at zero unless
//! the classifier's resolved branch changes.

use crate::{
    error::SlaResult,
    rollup::{EvaluationPass, Rollup, StatusTally},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutiveSummary {
    pub total_items:           u32,
    pub within_sla_count:      u32,
    pub at_risk_count:         u32,
    pub critical_count:        u32,
    pub breached_count:        u32,
    pub invalid_timing_count:  u32,
    /// `None` when nothing was evaluated.
    pub compliance_percentage: Option<f64>,
    pub at_risk_percentage:    Option<f64>,
    pub window_start:          DateTime<Utc>,
    pub last_updated:          DateTime<Utc>,
}

pub struct ExecutiveOverview;

impl Rollup for ExecutiveOverview {
    type Output = ExecutiveSummary;

    fn name(&self) -> &'static str {
        "executive_overview"
    }

    fn compute(&self, pass: &EvaluationPass<'_>) -> SlaResult<ExecutiveSummary> {
        let window_start = pass.days_before_now(pass.config.windows.trailing_days);
        let classified = pass.classified(|item| {
            item.is_resolved() && item.created_at >= window_start
        })?;

        let mut tally = StatusTally::default();
        for (_, classification) in &classified {
            tally.record(classification);
        }

        log::debug!(
            "executive_overview: {} resolved items since {window_start}, compliance={:?}",
            tally.total,
            tally.compliance_pct(),
        );

        Ok(ExecutiveSummary {
            total_items:           tally.total,
            within_sla_count:      tally.within_sla,
            at_risk_count:         tally.at_risk,
            critical_count:        tally.critical,
            breached_count:        tally.breached,
            invalid_timing_count:  tally.invalid_timing,
            compliance_percentage: tally.compliance_pct(),
            at_risk_percentage:    tally.at_risk_pct(),
            window_start,
            last_updated:          pass.now,
        })
    }
}
