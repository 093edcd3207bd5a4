//! Site reliability rollup — per-site incident/task load, resolution
//! speed, compliance, risk level and status.
//!
//! Compliance here is NOT the resolved-binary rule: an open incident that
//! is still inside its window counts as compliant. Sites listed in the
//! snapshot's site directory appear even with no items.
//!
//! Status rules, first match wins:
//!   1. ActiveIncidents  — any open incident
//!   2. HighFrequency    — incidents in the short window ≥ threshold
//!   3. SlowResolution   — mean resolution > threshold minutes
//!   4. Healthy

use crate::{
    classifier::{Classification, SlaStatus},
    config::SiteConfig,
    error::SlaResult,
    query::Pagination,
    rollup::{percentage, DurationMean, EvaluationPass, Rollup},
    types::EntityId,
    work_item::{ItemKind, WorkItem},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_incident_count(incidents: u32, config: &SiteConfig) -> Self {
        if incidents > config.high_risk_incidents {
            Self::High
        } else if incidents > config.medium_risk_incidents {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    ActiveIncidents,
    HighFrequency,
    SlowResolution,
    Healthy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteSummary {
    pub site_id:                     EntityId,
    pub site_name:                   Option<String>,
    pub region:                      Option<String>,
    pub incident_count:              u32,
    pub open_incidents:              u32,
    pub resolved_incidents:          u32,
    pub incidents_30_days:           u32,
    pub incidents_7_days:            u32,
    pub avg_resolution_time_minutes: Option<f64>,
    pub task_count:                  u32,
    pub pending_tasks:               u32,
    pub completed_tasks:             u32,
    pub invalid_timing_count:        u32,
    pub sla_compliance_percentage:   Option<f64>,
    pub risk_level:                  RiskLevel,
    pub site_status:                 SiteStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteFilter {
    pub region:      Option<String>,
    pub risk_level:  Option<RiskLevel>,
    pub site_status: Option<SiteStatus>,
    pub pagination:  Pagination,
}

impl SiteFilter {
    pub fn matches(&self, row: &SiteSummary) -> bool {
        self.region.as_ref().map_or(true, |r| row.region.as_ref() == Some(r))
            && self.risk_level.map_or(true, |r| row.risk_level == r)
            && self.site_status.map_or(true, |s| row.site_status == s)
    }
}

#[derive(Default)]
struct SiteAccumulator {
    incident_count:     u32,
    open_incidents:     u32,
    resolved_incidents: u32,
    incidents_long:     u32,
    incidents_short:    u32,
    resolution:         DurationMean,
    task_count:         u32,
    pending_tasks:      u32,
    completed_tasks:    u32,
    invalid_timing:     u32,
    compliant:          u32,
    evaluated:          u32,
    /// Region seen on items, taken from the lowest item id.
    item_region:        Option<(EntityId, String)>,
}

impl SiteAccumulator {
    fn note_region(&mut self, item: &WorkItem) {
        let Some(region) = &item.region else { return };
        let replace = match &self.item_region {
            Some((id, _)) => item.id < *id,
            None => true,
        };
        if replace {
            self.item_region = Some((item.id.clone(), region.clone()));
        }
    }

    fn record_incident(&mut self, item: &WorkItem, c: &Classification, pass: &EvaluationPass<'_>) {
        self.incident_count += 1;
        if item.is_resolved() {
            self.resolved_incidents += 1;
        } else {
            self.open_incidents += 1;
        }
        if item.created_at >= pass.days_before_now(pass.config.windows.long_recent_days) {
            self.incidents_long += 1;
        }
        if item.created_at >= pass.days_before_now(pass.config.windows.short_recent_days) {
            self.incidents_short += 1;
        }
        self.resolution.add_resolution(item, c);

        match c.status() {
            None => self.invalid_timing += 1,
            Some(status) => {
                self.evaluated += 1;
                let compliant = if c.is_open() {
                    status != SlaStatus::Breached
                } else {
                    status == SlaStatus::WithinSla
                };
                if compliant {
                    self.compliant += 1;
                }
            }
        }
    }

    fn record_task(&mut self, item: &WorkItem, c: &Classification) {
        self.task_count += 1;
        if item.is_resolved() {
            self.completed_tasks += 1;
        } else {
            self.pending_tasks += 1;
        }
        if !c.has_valid_timing() {
            self.invalid_timing += 1;
        }
    }

    fn finish(
        self,
        site_id: EntityId,
        site_name: Option<String>,
        directory_region: Option<String>,
        config: &SiteConfig,
    ) -> SiteSummary {
        let avg_resolution = self.resolution.mean_minutes();
        let site_status = if self.open_incidents > 0 {
            SiteStatus::ActiveIncidents
        } else if self.incidents_short >= config.high_frequency_incidents {
            SiteStatus::HighFrequency
        } else if avg_resolution.is_some_and(|m| m > config.slow_resolution_minutes) {
            SiteStatus::SlowResolution
        } else {
            SiteStatus::Healthy
        };

        SiteSummary {
            site_id,
            site_name,
            region: directory_region.or(self.item_region.map(|(_, region)| region)),
            incident_count:              self.incident_count,
            open_incidents:              self.open_incidents,
            resolved_incidents:          self.resolved_incidents,
            incidents_30_days:           self.incidents_long,
            incidents_7_days:            self.incidents_short,
            avg_resolution_time_minutes: avg_resolution,
            task_count:                  self.task_count,
            pending_tasks:               self.pending_tasks,
            completed_tasks:             self.completed_tasks,
            invalid_timing_count:        self.invalid_timing,
            sla_compliance_percentage:   percentage(self.compliant, self.evaluated),
            risk_level:                  RiskLevel::from_incident_count(self.incident_count, config),
            site_status,
        }
    }
}

pub struct SiteReliability;

impl Rollup for SiteReliability {
    type Output = Vec<SiteSummary>;

    fn name(&self) -> &'static str {
        "site_reliability"
    }

    /// All sites, ordered by descending incident count, then site id.
    fn compute(&self, pass: &EvaluationPass<'_>) -> SlaResult<Vec<SiteSummary>> {
        let mut sites: BTreeMap<EntityId, SiteAccumulator> = pass
            .snapshot
            .sites
            .iter()
            .map(|s| (s.site_id.clone(), SiteAccumulator::default()))
            .collect();

        let classified = pass.classified(|item| {
            item.site_id.is_some() && matches!(item.kind, ItemKind::Incident | ItemKind::Task)
        })?;

        for (item, classification) in &classified {
            let Some(site_id) = &item.site_id else { continue };
            let acc = sites.entry(site_id.clone()).or_default();
            acc.note_region(item);
            match item.kind {
                ItemKind::Incident => acc.record_incident(item, classification, pass),
                ItemKind::Task => acc.record_task(item, classification),
                ItemKind::AccessRequest => {}
            }
        }

        let mut rows: Vec<SiteSummary> = sites
            .into_iter()
            .map(|(site_id, acc)| {
                let directory = pass.snapshot.site(&site_id);
                let name = directory.map(|s| s.name.clone());
                let region = directory.and_then(|s| s.region.clone());
                acc.finish(site_id, name, region, &pass.config.site)
            })
            .collect();

        rows.sort_by(|a, b| {
            b.incident_count
                .cmp(&a.incident_count)
                .then_with(|| a.site_id.cmp(&b.site_id))
        });

        log::debug!("site_reliability: {} sites from {} items", rows.len(), classified.len());
        Ok(rows)
    }
}
