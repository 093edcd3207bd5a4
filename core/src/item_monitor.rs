//! Per-item SLA lists: incident monitoring, task performance and
//! access-request SLA. One row per item of the monitored kind, open or
//! resolved, ordered by ascending deadline.

use crate::{
    classifier::SlaStatus,
    error::SlaResult,
    query::Pagination,
    rollup::{EvaluationPass, Rollup},
    types::{EntityId, Minutes},
    work_item::{normalize_category, ItemKind},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    Open,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemSlaRecord {
    pub id:                EntityId,
    pub kind:              ItemKind,
    pub category:          Option<String>,
    pub window_minutes:    Minutes,
    pub created_at:        DateTime<Utc>,
    pub resolved_at:       Option<DateTime<Utc>>,
    pub deadline:          DateTime<Utc>,
    /// Open items only.
    pub remaining_minutes: Option<i64>,
    pub percent_used:      Option<f64>,
    /// `None` for items with invalid timing.
    pub sla_status:        Option<SlaStatus>,
    pub site_id:           Option<EntityId>,
    pub site_name:         Option<String>,
    pub region:            Option<String>,
    pub technician_id:     Option<EntityId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ItemFilter {
    pub category:   Option<String>,
    pub region:     Option<String>,
    pub status:     Option<SlaStatus>,
    pub resolution: Option<ResolutionState>,
    pub from_date:  Option<DateTime<Utc>>,
    pub to_date:    Option<DateTime<Utc>>,
    pub pagination: Pagination,
}

impl ItemFilter {
    pub fn matches(&self, row: &ItemSlaRecord) -> bool {
        let category = self.category.as_deref().and_then(normalize_category);
        let resolution = if row.resolved_at.is_some() {
            ResolutionState::Resolved
        } else {
            ResolutionState::Open
        };

        category.map_or(true, |c| row.category.as_ref() == Some(&c))
            && self.region.as_ref().map_or(true, |r| row.region.as_ref() == Some(r))
            && self.status.map_or(true, |s| row.sla_status == Some(s))
            && self.resolution.map_or(true, |r| resolution == r)
            && self.from_date.map_or(true, |d| row.created_at >= d)
            && self.to_date.map_or(true, |d| row.created_at <= d)
    }
}

pub struct ItemMonitor {
    pub kind: ItemKind,
}

impl ItemMonitor {
    pub fn new(kind: ItemKind) -> Self {
        Self { kind }
    }
}

impl Rollup for ItemMonitor {
    type Output = Vec<ItemSlaRecord>;

    fn name(&self) -> &'static str {
        match self.kind {
            ItemKind::Incident      => "incident_monitor",
            ItemKind::Task          => "task_monitor",
            ItemKind::AccessRequest => "access_request_monitor",
        }
    }

    fn compute(&self, pass: &EvaluationPass<'_>) -> SlaResult<Vec<ItemSlaRecord>> {
        let mut rows: Vec<ItemSlaRecord> = pass
            .classified(|item| item.kind == self.kind)?
            .into_iter()
            .map(|(item, classification)| ItemSlaRecord {
                id:                item.id.clone(),
                kind:              item.kind,
                category:          item.category.clone(),
                window_minutes:    classification.window_minutes,
                created_at:        item.created_at,
                resolved_at:       item.resolved_at,
                deadline:          classification.deadline,
                remaining_minutes: classification.remaining_minutes(),
                percent_used:      classification.percent_used(),
                sla_status:        classification.status(),
                site_id:           item.site_id.clone(),
                site_name:         item
                    .site_id
                    .as_deref()
                    .and_then(|id| pass.snapshot.site(id))
                    .map(|s| s.name.clone()),
                region:            item.region.clone(),
                technician_id:     item.technician_id.clone(),
            })
            .collect();

        rows.sort_by(|a, b| a.deadline.cmp(&b.deadline).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }
}
