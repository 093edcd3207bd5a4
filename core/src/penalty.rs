//! Contractual penalty exposure for late incidents.
//!
//! Delay is measured past the incident's deadline: to resolution for
//! resolved incidents, to `now` for open ones. The delay picks a tier
//! percentage of the quarterly fee, capped per fault; the quarter total
//! is capped again in aggregate. The snapshot is taken to be one quarter.

use crate::{
    config::PenaltyConfig,
    error::SlaResult,
    rollup::{round_to, EvaluationPass, Rollup},
    types::EntityId,
    work_item::ItemKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PenaltyExposure {
    pub incident_id:    EntityId,
    pub category:       Option<String>,
    pub deadline:       DateTime<Utc>,
    /// Resolution time, or `now` for open incidents.
    pub measured_at:    DateTime<Utc>,
    pub delay_hours:    f64,
    pub penalty_pct:    f64,
    pub penalty_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuarterPenaltySummary {
    pub quarterly_fee:         f64,
    pub total_penalty_amount:  f64,
    pub total_penalty_pct:     f64,
    pub penalised_fault_count: u32,
    pub termination_risk:      bool,
    pub incidents:             Vec<PenaltyExposure>,
}

/// Tier percentage for a delay, before the per-fault cap.
pub fn tier_pct(delay_hours: f64, config: &PenaltyConfig) -> f64 {
    config
        .tiers
        .iter()
        .rev()
        .find(|tier| delay_hours >= tier.min_delay_hours)
        .map_or(0.0, |tier| tier.penalty_pct)
}

pub struct PenaltyCalculator;

impl Rollup for PenaltyCalculator {
    type Output = QuarterPenaltySummary;

    fn name(&self) -> &'static str {
        "penalty_exposure"
    }

    fn compute(&self, pass: &EvaluationPass<'_>) -> SlaResult<QuarterPenaltySummary> {
        let config = &pass.config.penalty;
        let mut classified = pass.classified(|item| item.kind == ItemKind::Incident)?;
        classified.sort_by(|a, b| a.0.id.cmp(&b.0.id));

        let mut incidents = Vec::with_capacity(classified.len());
        for (item, classification) in classified {
            if !classification.has_valid_timing() {
                continue;
            }
            let measured_at = item.resolved_at.unwrap_or(pass.now);
            let delay_seconds = (measured_at - classification.deadline).num_seconds();
            let delay_hours = if delay_seconds > 0 { delay_seconds as f64 / 3600.0 } else { 0.0 };
            let penalty_pct = tier_pct(delay_hours, config).min(config.per_fault_cap_pct);

            incidents.push(PenaltyExposure {
                incident_id:    item.id.clone(),
                category:       item.category.clone(),
                deadline:       classification.deadline,
                measured_at,
                delay_hours:    round_to(delay_hours, 2),
                penalty_pct,
                penalty_amount: round_to(config.quarterly_fee * penalty_pct / 100.0, 2),
            });
        }

        let uncapped: f64 = incidents.iter().map(|e| e.penalty_amount).sum();
        let total = uncapped.min(config.quarterly_fee * config.aggregate_cap_pct / 100.0);
        let total_pct = if config.quarterly_fee > 0.0 {
            round_to(total / config.quarterly_fee * 100.0, 2)
        } else {
            0.0
        };
        let penalised = incidents.iter().filter(|e| e.penalty_pct > 0.0).count() as u32;

        if penalised >= config.termination_threshold {
            log::warn!(
                "penalty_exposure: {penalised} penalised faults this quarter (termination threshold {})",
                config.termination_threshold,
            );
        }

        Ok(QuarterPenaltySummary {
            quarterly_fee:         config.quarterly_fee,
            total_penalty_amount:  round_to(total, 2),
            total_penalty_pct:     total_pct,
            penalised_fault_count: penalised,
            termination_risk:      penalised >= config.termination_threshold,
            incidents,
        })
    }
}
