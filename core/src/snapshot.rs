//! Work snapshots — the immutable input of every evaluation pass.
//!
//! A snapshot is supplied by a SnapshotProvider, already filtered to a
//! trailing window. The engine only reads it.

use crate::{
    error::SlaResult,
    types::EntityId,
    work_item::WorkItem,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteRef {
    pub site_id: EntityId,
    pub name:    String,
    #[serde(default)]
    pub region:  Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnicianRef {
    pub technician_id: EntityId,
    pub full_name:     String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkSnapshot {
    pub captured_at: DateTime<Utc>,
    pub items:       Vec<WorkItem>,
    /// Site directory. Sites listed here appear in the site rollup even
    /// with no items.
    #[serde(default)]
    pub sites:       Vec<SiteRef>,
    #[serde(default)]
    pub technicians: Vec<TechnicianRef>,
}

impl WorkSnapshot {
    pub fn new(captured_at: DateTime<Utc>, items: Vec<WorkItem>) -> Self {
        Self { captured_at, items, sites: Vec::new(), technicians: Vec::new() }
    }

    pub fn with_sites(mut self, sites: Vec<SiteRef>) -> Self {
        self.sites = sites;
        self
    }

    pub fn with_technicians(mut self, technicians: Vec<TechnicianRef>) -> Self {
        self.technicians = technicians;
        self
    }

    pub fn site(&self, site_id: &str) -> Option<&SiteRef> {
        self.sites.iter().find(|s| s.site_id == site_id)
    }

    pub fn technician(&self, technician_id: &str) -> Option<&TechnicianRef> {
        self.technicians.iter().find(|t| t.technician_id == technician_id)
    }
}

/// Trailing window a provider filters to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotWindow {
    pub until: DateTime<Utc>,
    pub days:  i64,
}

impl SnapshotWindow {
    pub fn trailing(until: DateTime<Utc>, days: i64) -> Self {
        Self { until, days }
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.until - Duration::days(self.days)
    }

    /// Resolved items must have been created inside the window; open items
    /// are live obligations and are always kept.
    pub fn admits(&self, item: &WorkItem) -> bool {
        !item.is_resolved() || item.created_at >= self.since()
    }
}

/// Supplies the current set of work items. The engine never fetches or
/// caches on its own.
pub trait SnapshotProvider {
    fn snapshot(&self, window: SnapshotWindow) -> SlaResult<WorkSnapshot>;
}

/// Provider over an in-memory item list.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotProvider {
    items:       Vec<WorkItem>,
    sites:       Vec<SiteRef>,
    technicians: Vec<TechnicianRef>,
}

impl StaticSnapshotProvider {
    pub fn new(items: Vec<WorkItem>) -> Self {
        Self { items, ..Self::default() }
    }

    pub fn with_sites(mut self, sites: Vec<SiteRef>) -> Self {
        self.sites = sites;
        self
    }

    pub fn with_technicians(mut self, technicians: Vec<TechnicianRef>) -> Self {
        self.technicians = technicians;
        self
    }
}

impl SnapshotProvider for StaticSnapshotProvider {
    fn snapshot(&self, window: SnapshotWindow) -> SlaResult<WorkSnapshot> {
        let items = self
            .items
            .iter()
            .filter(|item| window.admits(item))
            .cloned()
            .collect();
        Ok(WorkSnapshot {
            captured_at: window.until,
            items,
            sites:       self.sites.clone(),
            technicians: self.technicians.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn static_provider_keeps_open_items_and_recent_resolved_ones() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let old = now - Duration::days(120);
        let provider = StaticSnapshotProvider::new(vec![
            WorkItem::incident("old-open", "minor", old),
            WorkItem::incident("old-done", "minor", old).resolved(old + Duration::hours(1)),
            WorkItem::incident("new-done", "minor", now - Duration::days(2)).resolved(now),
        ]);

        let snapshot = provider
            .snapshot(SnapshotWindow::trailing(now, DEFAULT_WINDOW_DAYS))
            .expect("static snapshot");
        let ids: Vec<&str> = snapshot.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["old-open", "new-done"]);
        assert_eq!(snapshot.captured_at, now);
    }
}
