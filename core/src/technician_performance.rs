//! Technician performance rollup.
//!
//! DESIGN RULE: This view is non-punitive. It exposes aggregate counts and
//! percentages only, never the items behind them.
//!
//! Compliance uses the resolved-binary rule. The performance level is
//! scored from incident compliance unless the config asks for a blend.

use crate::{
    config::{PerformanceBasis, TechnicianConfig},
    error::SlaResult,
    query::Pagination,
    rollup::{ComplianceCounter, DurationMean, EvaluationPass, Rollup},
    types::EntityId,
    work_item::ItemKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkloadLevel {
    Low,
    Medium,
    High,
}

impl WorkloadLevel {
    pub fn from_workload(workload: u32, config: &TechnicianConfig) -> Self {
        if workload > config.high_workload {
            Self::High
        } else if workload > config.medium_workload {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceLevel {
    Excellent,
    Good,
    NeedsSupport,
    AtRisk,
}

impl PerformanceLevel {
    pub fn from_compliance(pct: f64, config: &TechnicianConfig) -> Self {
        if pct >= config.excellent_pct {
            Self::Excellent
        } else if pct >= config.good_pct {
            Self::Good
        } else if pct >= config.needs_support_pct {
            Self::NeedsSupport
        } else {
            Self::AtRisk
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnicianSummary {
    pub technician_id:                   EntityId,
    pub full_name:                       Option<String>,
    pub incident_count:                  u32,
    pub task_count:                      u32,
    pub open_incidents:                  u32,
    pub pending_tasks:                   u32,
    pub total_workload:                  u32,
    pub incident_sla_compliance:         Option<f64>,
    pub task_sla_compliance:             Option<f64>,
    pub avg_incident_resolution_minutes: Option<f64>,
    pub avg_task_completion_minutes:     Option<f64>,
    pub workload_level:                  WorkloadLevel,
    /// `None` until the scored compliance figure has a denominator.
    pub performance_level:               Option<PerformanceLevel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TechnicianFilter {
    pub workload_level:    Option<WorkloadLevel>,
    pub performance_level: Option<PerformanceLevel>,
    pub pagination:        Pagination,
}

impl TechnicianFilter {
    pub fn matches(&self, row: &TechnicianSummary) -> bool {
        self.workload_level.map_or(true, |w| row.workload_level == w)
            && self
                .performance_level
                .map_or(true, |p| row.performance_level == Some(p))
    }
}

#[derive(Default)]
struct TechnicianAccumulator {
    incident_count:      u32,
    task_count:          u32,
    open_incidents:      u32,
    pending_tasks:       u32,
    incident_compliance: ComplianceCounter,
    task_compliance:     ComplianceCounter,
    incident_resolution: DurationMean,
    task_completion:     DurationMean,
}

impl TechnicianAccumulator {
    fn finish(self, technician_id: EntityId, full_name: Option<String>, config: &TechnicianConfig) -> TechnicianSummary {
        let total_workload = self.incident_count + self.task_count;
        let scored = match config.performance_basis {
            PerformanceBasis::IncidentOnly => self.incident_compliance,
            PerformanceBasis::Blended => self.incident_compliance.merge(&self.task_compliance),
        };

        TechnicianSummary {
            technician_id,
            full_name,
            incident_count:                  self.incident_count,
            task_count:                      self.task_count,
            open_incidents:                  self.open_incidents,
            pending_tasks:                   self.pending_tasks,
            total_workload,
            incident_sla_compliance:         self.incident_compliance.pct(),
            task_sla_compliance:             self.task_compliance.pct(),
            avg_incident_resolution_minutes: self.incident_resolution.mean_minutes(),
            avg_task_completion_minutes:     self.task_completion.mean_minutes(),
            workload_level:                  WorkloadLevel::from_workload(total_workload, config),
            performance_level:               scored
                .pct()
                .map(|pct| PerformanceLevel::from_compliance(pct, config)),
        }
    }
}

pub struct TechnicianPerformance;

impl Rollup for TechnicianPerformance {
    type Output = Vec<TechnicianSummary>;

    fn name(&self) -> &'static str {
        "technician_performance"
    }

    /// Ordered by descending workload, then technician id.
    fn compute(&self, pass: &EvaluationPass<'_>) -> SlaResult<Vec<TechnicianSummary>> {
        let mut technicians: BTreeMap<EntityId, TechnicianAccumulator> = pass
            .snapshot
            .technicians
            .iter()
            .map(|t| (t.technician_id.clone(), TechnicianAccumulator::default()))
            .collect();

        let classified = pass.classified(|item| {
            item.technician_id.is_some() && matches!(item.kind, ItemKind::Incident | ItemKind::Task)
        })?;

        for (item, classification) in &classified {
            let Some(technician_id) = &item.technician_id else { continue };
            let acc = technicians.entry(technician_id.clone()).or_default();
            match item.kind {
                ItemKind::Incident => {
                    acc.incident_count += 1;
                    if !item.is_resolved() {
                        acc.open_incidents += 1;
                    }
                    acc.incident_compliance.record_resolved(classification);
                    acc.incident_resolution.add_resolution(item, classification);
                }
                ItemKind::Task => {
                    acc.task_count += 1;
                    if !item.is_resolved() {
                        acc.pending_tasks += 1;
                    }
                    acc.task_compliance.record_resolved(classification);
                    acc.task_completion.add_resolution(item, classification);
                }
                ItemKind::AccessRequest => {}
            }
        }

        let mut rows: Vec<TechnicianSummary> = technicians
            .into_iter()
            .map(|(technician_id, acc)| {
                let name = pass.snapshot.technician(&technician_id).map(|t| t.full_name.clone());
                acc.finish(technician_id, name, &pass.config.technician)
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total_workload
                .cmp(&a.total_workload)
                .then_with(|| a.technician_id.cmp(&b.technician_id))
        });

        log::debug!("technician_performance: {} technicians", rows.len());
        Ok(rows)
    }
}
