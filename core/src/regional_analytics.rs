//! Regional analytics rollup.
//!
//! Incident and task compliance are computed independently with the
//! resolved-binary rule, then blended into one overall score using the
//! configured weighting. Status counts cover every item in the region,
//! open or resolved, all kinds.

use crate::{
    config::{ComplianceWeighting, RegionalConfig},
    error::SlaResult,
    query::Pagination,
    rollup::{round_to, ComplianceCounter, EvaluationPass, Rollup, StatusTally},
    work_item::ItemKind,
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionStatus {
    Excellent,
    Good,
    AtRisk,
    Critical,
}

impl RegionStatus {
    pub fn from_compliance(pct: f64, config: &RegionalConfig) -> Self {
        if pct >= config.excellent_pct {
            Self::Excellent
        } else if pct >= config.good_pct {
            Self::Good
        } else if pct >= config.at_risk_pct {
            Self::AtRisk
        } else {
            Self::Critical
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionSummary {
    pub region:               String,
    #[serde(flatten)]
    pub statuses:             StatusTally,
    pub incident_count:       u32,
    pub task_count:           u32,
    pub access_request_count: u32,
    pub incident_compliance:  Option<f64>,
    pub task_compliance:      Option<f64>,
    /// With `Equal` weighting, a side with no evaluated items drops out:
    /// the other side's figure is reported alone rather than as null.
    pub overall_compliance:   Option<f64>,
    pub region_status:        Option<RegionStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegionFilter {
    pub region_status: Option<RegionStatus>,
    pub pagination:    Pagination,
}

impl RegionFilter {
    pub fn matches(&self, row: &RegionSummary) -> bool {
        self.region_status.map_or(true, |s| row.region_status == Some(s))
    }
}

/// Blend incident and task compliance. With `Equal`, a side with no
/// evaluated items drops out instead of counting as 0%.
pub fn blend_compliance(
    incidents: &ComplianceCounter,
    tasks: &ComplianceCounter,
    weighting: ComplianceWeighting,
) -> Option<f64> {
    match weighting {
        ComplianceWeighting::Equal => match (incidents.pct(), tasks.pct()) {
            (Some(i), Some(t)) => Some(round_to((i + t) / 2.0, 2)),
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        },
        ComplianceWeighting::ByVolume => incidents.merge(tasks).pct(),
    }
}

#[derive(Default)]
struct RegionAccumulator {
    statuses:             StatusTally,
    incident_count:       u32,
    task_count:           u32,
    access_request_count: u32,
    incident_compliance:  ComplianceCounter,
    task_compliance:      ComplianceCounter,
}

pub struct RegionalAnalytics;

impl Rollup for RegionalAnalytics {
    type Output = Vec<RegionSummary>;

    fn name(&self) -> &'static str {
        "regional_analytics"
    }

    /// Ordered by descending overall compliance (regions without a score
    /// last), then region name.
    fn compute(&self, pass: &EvaluationPass<'_>) -> SlaResult<Vec<RegionSummary>> {
        let mut regions: BTreeMap<String, RegionAccumulator> = BTreeMap::new();

        for (item, classification) in pass.classified(|item| item.region.is_some())? {
            let Some(region) = &item.region else { continue };
            let acc = regions.entry(region.clone()).or_default();
            acc.statuses.record(&classification);
            match item.kind {
                ItemKind::Incident => {
                    acc.incident_count += 1;
                    acc.incident_compliance.record_resolved(&classification);
                }
                ItemKind::Task => {
                    acc.task_count += 1;
                    acc.task_compliance.record_resolved(&classification);
                }
                ItemKind::AccessRequest => acc.access_request_count += 1,
            }
        }

        let config = &pass.config.regional;
        let mut rows: Vec<RegionSummary> = regions
            .into_iter()
            .map(|(region, acc)| {
                let overall = blend_compliance(&acc.incident_compliance, &acc.task_compliance, config.weighting);
                RegionSummary {
                    region,
                    statuses:             acc.statuses,
                    incident_count:       acc.incident_count,
                    task_count:           acc.task_count,
                    access_request_count: acc.access_request_count,
                    incident_compliance:  acc.incident_compliance.pct(),
                    task_compliance:      acc.task_compliance.pct(),
                    overall_compliance:   overall,
                    region_status:        overall.map(|pct| RegionStatus::from_compliance(pct, config)),
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            descending_score(a.overall_compliance, b.overall_compliance)
                .then_with(|| a.region.cmp(&b.region))
        });

        log::debug!("regional_analytics: {} regions", rows.len());
        Ok(rows)
    }
}

fn descending_score(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
