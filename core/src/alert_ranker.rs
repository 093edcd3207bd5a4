//! Alert ranker — the ordered escalation feed of open items.
//!
//! Only unresolved items of the configured kinds (incidents and tasks by
//! default) are considered. Breached and Critical items are kept; AtRisk
//! joins the feed only when the config enables the third tier.
//!
//! Ordering: (priority, deadline ascending, item id). The most overdue
//! or soonest-due item leads within each level.

use crate::{
    classifier::SlaStatus,
    error::SlaResult,
    query::Pagination,
    rollup::{EvaluationPass, Rollup},
    types::EntityId,
    work_item::ItemKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Breached,
    Critical,
    AtRisk,
}

impl AlertLevel {
    pub fn from_status(status: SlaStatus) -> Option<Self> {
        match status {
            SlaStatus::Breached  => Some(Self::Breached),
            SlaStatus::Critical  => Some(Self::Critical),
            SlaStatus::AtRisk    => Some(Self::AtRisk),
            SlaStatus::WithinSla => None,
        }
    }

    /// 1 is the most urgent.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Breached => 1,
            Self::Critical => 2,
            Self::AtRisk   => 3,
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Breached => "BREACHED",
            Self::Critical => "CRITICAL",
            Self::AtRisk   => "AT_RISK",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertEntry {
    pub item_id:           EntityId,
    pub kind:              ItemKind,
    pub category:          Option<String>,
    pub alert_level:       AlertLevel,
    pub priority:          u8,
    pub created_at:        DateTime<Utc>,
    pub deadline:          DateTime<Utc>,
    pub remaining_minutes: i64,
    pub percent_used:      f64,
    pub site_id:           Option<EntityId>,
    pub region:            Option<String>,
    pub technician_id:     Option<EntityId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertFilter {
    pub alert_level: Option<AlertLevel>,
    pub kind:        Option<ItemKind>,
    pub region:      Option<String>,
    pub pagination:  Pagination,
}

impl AlertFilter {
    pub fn matches(&self, row: &AlertEntry) -> bool {
        self.alert_level.map_or(true, |l| row.alert_level == l)
            && self.kind.map_or(true, |k| row.kind == k)
            && self.region.as_ref().map_or(true, |r| row.region.as_ref() == Some(r))
    }
}

pub struct AlertRanker;

impl Rollup for AlertRanker {
    type Output = Vec<AlertEntry>;

    fn name(&self) -> &'static str {
        "alert_ranker"
    }

    fn compute(&self, pass: &EvaluationPass<'_>) -> SlaResult<Vec<AlertEntry>> {
        let alerts = &pass.config.alerts;
        let classified = pass.classified(|item| {
            !item.is_resolved() && alerts.item_kinds.contains(&item.kind)
        })?;

        let mut feed: Vec<AlertEntry> = classified
            .into_iter()
            .filter_map(|(item, classification)| {
                let level = AlertLevel::from_status(classification.status()?)?;
                if level == AlertLevel::AtRisk && !alerts.include_at_risk {
                    return None;
                }
                Some(AlertEntry {
                    item_id:           item.id.clone(),
                    kind:              item.kind,
                    category:          item.category.clone(),
                    alert_level:       level,
                    priority:          level.priority(),
                    created_at:        item.created_at,
                    deadline:          classification.deadline,
                    remaining_minutes: classification.remaining_minutes()?,
                    percent_used:      classification.percent_used()?,
                    site_id:           item.site_id.clone(),
                    region:            item.region.clone(),
                    technician_id:     item.technician_id.clone(),
                })
            })
            .collect();

        feed.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.deadline.cmp(&b.deadline))
                .then_with(|| a.item_id.cmp(&b.item_id))
        });

        log::debug!("alert_ranker: {} alerts", feed.len());
        Ok(feed)
    }
}
